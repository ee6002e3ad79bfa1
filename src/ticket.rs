//! Ticket model: the server's retrieval plan.
//!
//! A ticket is an ordered list of segments. Order is retrieval order and is
//! preserved exactly; segments are never reordered or deduplicated. The wire
//! form (`urls` array of url + headers objects, per htsget) is resolved once
//! at parse time into a tagged [`Segment`], so the `data:` prefix is never
//! re-inspected at read time.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Ticket response as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketResponse {
    pub urls: Vec<UrlEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

/// Inclusive byte range, as carried by a `Range: bytes=start-end` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range` header value. Only the exact shape
    /// `bytes=<start>-<end>` is accepted. A `0-0` range means "no range"
    /// by protocol convention and yields `None`.
    pub fn parse(value: &str) -> Result<Option<ByteRange>> {
        let invalid = || Error::InvalidRange(value.to_string());

        let rest = value.strip_prefix("bytes=").ok_or_else(invalid)?;
        let (start, end) = rest.split_once('-').ok_or_else(invalid)?;
        if start.is_empty()
            || end.is_empty()
            || !start.bytes().all(|b| b.is_ascii_digit())
            || !end.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let start: u64 = start.parse().map_err(|_| invalid())?;
        let end: u64 = end.parse().map_err(|_| invalid())?;

        if start == 0 && end == 0 {
            return Ok(None);
        }
        if end <= start {
            return Err(invalid());
        }
        Ok(Some(ByteRange { start, end }))
    }

    /// Locate and parse the `Range` entry in a header map, case-insensitively.
    pub fn from_headers(headers: &HashMap<String, String>) -> Result<Option<ByteRange>> {
        let value = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("range"))
            .map(|(_, value)| value);
        match value {
            Some(value) => Self::parse(value),
            None => Ok(None),
        }
    }

    /// Number of bytes covered by the range (both ends inclusive).
    pub fn byte_len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn to_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// One retrievable unit within a ticket.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Payload embedded in the ticket itself; no network I/O needed.
    Inline(Vec<u8>),
    /// Remote resource, optionally restricted to a byte range. Headers are
    /// forwarded on the data request (minus `Range`, which is normalized).
    Remote {
        url: Url,
        range: Option<ByteRange>,
        headers: HashMap<String, String>,
    },
}

/// Parsed retrieval plan. Immutable after creation, consumed by one query.
#[derive(Debug)]
pub struct Ticket {
    segments: Vec<Segment>,
}

impl Ticket {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl TryFrom<TicketResponse> for Ticket {
    type Error = Error;

    fn try_from(response: TicketResponse) -> Result<Ticket> {
        let mut segments = Vec::with_capacity(response.urls.len());
        for entry in response.urls {
            let url = Url::parse(&entry.url)?;
            if url.scheme().eq_ignore_ascii_case("data") {
                segments.push(Segment::Inline(decode_data_uri(&url)?));
            } else {
                let range = ByteRange::from_headers(&entry.headers)?;
                segments.push(Segment::Remote {
                    url,
                    range,
                    headers: entry.headers,
                });
            }
        }
        Ok(Ticket { segments })
    }
}

/// Decode an inline payload: base64 after the first comma of the URI body,
/// e.g. `data:;base64,SGVsbG8=`.
fn decode_data_uri(url: &Url) -> Result<Vec<u8>> {
    let body = url.path();
    let (_, payload) = body
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUri(url.to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidDataUri(format!("{url}: {e}")))
}
