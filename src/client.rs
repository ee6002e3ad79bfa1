//! Ticket acquisition, the single-attempt download path, and the
//! retry-from-scratch wrapper around it.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use ureq::Agent;
use ureq::http::StatusCode;

use crate::query::{Format, Query};
use crate::resolve;
use crate::stream::MultiReader;
use crate::ticket::{Ticket, TicketResponse};
use crate::{Error, Result};

const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Options for a [`TicketClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Buffer size for remote segment connections.
    pub buffer_size: usize,
    /// Echo each parsed ticket to stdout in canonical pretty-printed form.
    pub print_ticket: bool,
    /// Global timeout for each HTTP request, `None` for no timeout.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            print_ticket: false,
            timeout: None,
        }
    }
}

/// htsget ticket client: fetches a ticket and composes its segments into a
/// single ordered byte stream.
///
/// The client is synchronous and pull-based; each call performs a single
/// fail-fast attempt. Retry-from-scratch belongs to the caller.
pub struct TicketClient {
    agent: Agent,
    options: ClientOptions,
}

impl TicketClient {
    pub fn new(options: ClientOptions) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(options.timeout)
            .build()
            .new_agent();
        Self { agent, options }
    }

    /// GET the ticket document at `url` and parse it.
    ///
    /// Any status other than 200 is an [`Error::Endpoint`] carrying the
    /// observed code; the body is not parsed in that case.
    pub fn fetch_ticket(&self, url: &str) -> Result<Ticket> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(code) => Error::Endpoint {
                    code,
                    url: url.to_string(),
                },
                other => Error::Transport(Box::new(other)),
            })?;

        if response.status() != StatusCode::OK {
            return Err(Error::Endpoint {
                code: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(Box::new(e)))?;
        let ticket_response: TicketResponse = serde_json::from_str(&body)?;

        if self.options.print_ticket {
            // serializing a just-deserialized value cannot fail
            if let Ok(pretty) = serde_json::to_string_pretty(&ticket_response) {
                println!("{pretty}");
            }
        }

        let ticket = Ticket::try_from(ticket_response)?;
        tracing::debug!("ticket from {url}: {} segments", ticket.len());
        Ok(ticket)
    }

    /// Resolve a ticket into one composed stream. Remote connections are
    /// opened lazily as each segment becomes the head of the stream.
    pub fn open(&self, ticket: Ticket) -> Result<MultiReader> {
        resolve::join(&self.agent, ticket, self.options.buffer_size)
    }

    /// One complete attempt: fetch the ticket at `ticket_url`, compose its
    /// segments and copy the stream to `out`. Returns the byte count.
    pub fn download(&self, ticket_url: &str, out: &mut dyn Write) -> Result<u64> {
        let ticket = self.fetch_ticket(ticket_url)?;
        let mut stream = self.open(ticket)?;
        let bytes = io::copy(&mut stream, out)?;
        Ok(bytes)
    }
}

/// Re-run the whole ticket-acquisition-through-copy sequence up to
/// `attempts` times, writing to `output_file` or stdout. Partial file
/// output is discarded by truncating at the start of the next attempt;
/// partial stdout output cannot be unwritten. Only transport-level failures
/// are worth retrying; endpoint and parse failures will not get better on
/// a second try.
pub fn download_with_retries(
    client: &TicketClient,
    url: &str,
    output_file: Option<&Path>,
    attempts: u32,
) -> Result<u64> {
    let mut remaining = attempts.max(1);
    loop {
        remaining -= 1;
        match attempt(client, url, output_file) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if remaining > 0 && retryable(&e) => {
                tracing::warn!("attempt failed ({e}), {remaining} tries left");
            }
            Err(e) => return Err(e),
        }
    }
}

fn retryable(e: &Error) -> bool {
    matches!(
        e,
        Error::Transport(_) | Error::Io(_) | Error::IncompleteStream { .. }
    )
}

fn attempt(client: &TicketClient, url: &str, output_file: Option<&Path>) -> Result<u64> {
    match output_file {
        Some(path) => {
            let file = File::create(path)?;
            let mut out = BufWriter::new(file);
            let bytes = client.download(url, &mut out)?;
            out.flush()?;
            Ok(bytes)
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let bytes = client.download(url, &mut out)?;
            out.flush()?;
            Ok(bytes)
        }
    }
}

/// Build the query URL for an endpoint, mirroring the htsget GET interface:
/// `{base}{accession}?format={format}&referenceName={name}&start={s}[&end={e}]`.
///
/// `start` is clamped to a minimum of 1; `end` is omitted when zero.
pub fn format_url(base: &str, accession: &str, query: &Query, format: Format) -> String {
    let mut url = format!(
        "{base}{accession}?format={format}&referenceName={}",
        query.reference_name
    );
    url.push_str(&format!("&start={}", query.start.max(1)));
    if query.end > 0 {
        url.push_str(&format!("&end={}", query.end));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_url_full_query() {
        let query = Query {
            reference_name: "chr20".to_string(),
            start: 1000,
            end: 2000,
        };
        assert_eq!(
            format_url("http://host/reads/", "ACC123", &query, Format::Bam),
            "http://host/reads/ACC123?format=BAM&referenceName=chr20&start=1000&end=2000"
        );
    }

    #[test]
    fn test_format_url_clamps_start_to_one() {
        let query = Query {
            reference_name: "11".to_string(),
            start: 0,
            end: 0,
        };
        assert_eq!(
            format_url("http://host/", "X", &query, Format::Cram),
            "http://host/X?format=CRAM&referenceName=11&start=1"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(retryable(&Error::IncompleteStream {
            expected: 10,
            read: 4
        }));
        assert!(retryable(&Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset"
        ))));
        assert!(!retryable(&Error::Endpoint {
            code: 404,
            url: "http://host/x".to_string(),
        }));
        assert!(!retryable(&Error::InvalidRange("bytes=9-5".to_string())));
    }

    #[test]
    fn test_client_options_default() {
        let options = ClientOptions::default();
        assert_eq!(options.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!options.print_ticket);
        assert!(options.timeout.is_none());
    }
}
