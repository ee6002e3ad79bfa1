//! Segment resolver: turns ticket segments into byte sources.
//!
//! Inline payloads are decoded at parse time and served from memory. Remote
//! segments open one HTTP connection each, buffered for throughput, deferred
//! until the segment is actually reached by the consumer. A ranged
//! segment is bounded to exactly `end - start + 1` bytes. An unranged
//! segment gets a best-effort HEAD probe for its total length first: a
//! discovered length is enforced with a [`BoundedReader`], an undiscoverable
//! length is not an error and the connection's own end-of-stream is trusted.

use std::collections::HashMap;
use std::io::{self, BufReader, Cursor, Read};

use ureq::Agent;
use url::Url;

use crate::stream::{BoundedReader, ByteSource, MultiReader};
use crate::ticket::{ByteRange, Segment, Ticket};
use crate::{Error, Result};

/// Resolve every segment of a ticket, in order, into one composed stream.
///
/// Remote segments are resolved lazily: a segment's probe and data
/// connection are only issued once it becomes the head of the composition.
/// Exactly one connection is held at a time, and abandoning the stream
/// early acquires nothing for the segments never reached.
pub fn join(agent: &Agent, ticket: Ticket, buffer_size: usize) -> Result<MultiReader> {
    let sources = ticket
        .into_segments()
        .into_iter()
        .map(|segment| match segment {
            Segment::Inline(bytes) => Box::new(Cursor::new(bytes)) as ByteSource,
            remote @ Segment::Remote { .. } => Box::new(DeferredRemote {
                agent: agent.clone(),
                buffer_size,
                segment: Some(remote),
                source: None,
            }) as ByteSource,
        })
        .collect::<Vec<_>>();
    Ok(MultiReader::new(sources))
}

/// Open a single segment as a byte source, immediately.
pub fn open_segment(agent: &Agent, segment: Segment, buffer_size: usize) -> Result<ByteSource> {
    match segment {
        Segment::Inline(bytes) => Ok(Box::new(Cursor::new(bytes))),
        Segment::Remote {
            url,
            range,
            headers,
        } => open_remote(agent, &url, range, &headers, buffer_size),
    }
}

/// Remote segment that opens its connection on first read. Resolution
/// failures cross the `Read` boundary and stay pattern-matchable on the
/// other side.
struct DeferredRemote {
    agent: Agent,
    buffer_size: usize,
    segment: Option<Segment>,
    source: Option<ByteSource>,
}

impl Read for DeferredRemote {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let source = match &mut self.source {
            Some(source) => source,
            None => {
                let Some(segment) = self.segment.take() else {
                    // A failed open already consumed the segment; the
                    // stream is not resumable.
                    return Ok(0);
                };
                let opened = open_segment(&self.agent, segment, self.buffer_size)
                    .map_err(|e| e.into_io())?;
                self.source.insert(opened)
            }
        };
        source.read(buf)
    }
}

fn open_remote(
    agent: &Agent,
    url: &Url,
    range: Option<ByteRange>,
    headers: &HashMap<String, String>,
    buffer_size: usize,
) -> Result<ByteSource> {
    // A ranged segment has an exact length by construction; otherwise probe
    // before opening the data connection.
    let expected = match range {
        Some(range) => Some(range.byte_len()),
        None => probe_length(agent, url, headers),
    };

    let mut request = agent.get(url.as_str());
    for (name, value) in headers {
        if !name.eq_ignore_ascii_case("range") {
            request = request.header(name.as_str(), value.as_str());
        }
    }
    if let Some(range) = range {
        request = request.header("Range", range.to_header_value().as_str());
    }

    let response = request
        .call()
        .map_err(|e| endpoint_or_transport(e, url))?;
    tracing::debug!(
        "opened {url} (status {}, expected {expected:?} bytes)",
        response.status()
    );

    let body = BufReader::with_capacity(buffer_size, response.into_body().into_reader());
    Ok(match expected {
        Some(len) => Box::new(BoundedReader::new(body, len)),
        None => Box::new(body),
    })
}

/// Best-effort total-length discovery via HEAD. Any failure degrades to
/// "length unknown"; note this cannot distinguish a missing resource from a
/// server that just won't say (the data GET will surface the former).
fn probe_length(agent: &Agent, url: &Url, headers: &HashMap<String, String>) -> Option<u64> {
    let mut request = agent.head(url.as_str());
    for (name, value) in headers {
        if !name.eq_ignore_ascii_case("range") {
            request = request.header(name.as_str(), value.as_str());
        }
    }
    match request.call() {
        Ok(response) => response
            .headers()
            .get(ureq::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok()),
        Err(e) => {
            tracing::debug!("length probe failed for {url}: {e}");
            None
        }
    }
}

fn endpoint_or_transport(e: ureq::Error, url: &Url) -> Error {
    match e {
        ureq::Error::StatusCode(code) => Error::Endpoint {
            code,
            url: url.to_string(),
        },
        other => Error::Transport(Box::new(other)),
    }
}
