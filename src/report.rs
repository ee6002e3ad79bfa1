//! Diagnostics: run the configured test queries against every provider and
//! report what came back.
//!
//! The crate itself only measures bytes and elapsed time by draining the
//! composed stream through a [`CountingReader`]. The record-level counters
//! exist for an external format parser walking the same stream; they render
//! as zeros here.

use std::io::{self, Write};
use std::time::Instant;

use crate::client::{TicketClient, format_url};
use crate::config::{Configuration, Provider};
use crate::query::{Format, Query};
use crate::stream::CountingReader;
use crate::{Error, Result};

/// Accumulated observations for one query against one provider.
#[derive(Debug, Default)]
pub struct Report {
    pub reads: u64,
    pub unmapped_reads: u64,
    pub no_start: u64,
    pub miss_ref: u64,
    pub out_of_range: u64,
    pub min_start: Option<u64>,
    pub max_end: Option<u64>,
    pub bytes: u64,
    pub millis: u128,
}

impl Report {
    /// One-line rendering, `-` standing in for unobserved coordinates.
    pub fn print(&self) -> String {
        let min = self
            .min_start
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        let max = self
            .max_end
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        format!(
            "{} {} {} {} {} [{}, {}], {} bytes in {} ms",
            self.reads,
            self.unmapped_reads,
            self.no_start,
            self.miss_ref,
            self.out_of_range,
            min,
            max,
            self.bytes,
            self.millis
        )
    }
}

/// Run every configured test query against every provider, printing one
/// report line per combination on stdout. Failure details (HTTP code,
/// failing URL) go to stderr; failures are never fatal: the point is to
/// see which provider/query pairs are broken.
pub fn run(configuration: &Configuration, client: &TicketClient) {
    let stdout = io::stdout();
    let stderr = io::stderr();
    if let Err(e) = run_to(
        &mut stdout.lock(),
        &mut stderr.lock(),
        configuration,
        client,
    ) {
        tracing::warn!("diagnostics output failed: {e}");
    }
}

/// Writer-parameterized sweep backing [`run`].
pub fn run_to(
    out: &mut dyn Write,
    err: &mut dyn Write,
    configuration: &Configuration,
    client: &TicketClient,
) -> io::Result<()> {
    for (id, queries) in &configuration.test_queries {
        writeln!(out, "{id}")?;
        for query in queries {
            writeln!(out, "\t{query}")?;
            for (name, provider) in &configuration.providers {
                run_one(out, err, id, query, name, provider, client)?;
            }
        }
    }
    Ok(())
}

fn run_one(
    out: &mut dyn Write,
    err: &mut dyn Write,
    id: &str,
    query: &Query,
    name: &str,
    provider: &Provider,
    client: &TicketClient,
) -> io::Result<()> {
    write!(out, "\t\t{name:<10}")?;
    let Some(accession) = provider.accessions.get(id) else {
        writeln!(out, "\tNO ACCESSION")?;
        return Ok(());
    };
    let format = if id.contains("BAM") {
        Format::Bam
    } else {
        Format::Cram
    };
    let url = format_url(&provider.base, accession, query, format);

    match drain(client, &url) {
        Ok(report) => writeln!(out, "\t{:>20}", report.print())?,
        Err(Error::Endpoint { code, url }) => {
            writeln!(out)?;
            writeln!(err, "\tHTTP CODE {code}")?;
            writeln!(err, "{url}")?;
        }
        Err(e) => {
            writeln!(out, "\tERROR: {e}")?;
            writeln!(err, "{url}")?;
        }
    }
    Ok(())
}

/// Fetch, compose and fully drain one query's stream, reporting byte count
/// and elapsed time. An external format parser would consume `counting`
/// instead of the sink and fill in the record counters.
fn drain(client: &TicketClient, url: &str) -> Result<Report> {
    let started = Instant::now();
    let ticket = client.fetch_ticket(url)?;
    let stream = client.open(ticket)?;

    let mut counting = CountingReader::new(stream);
    io::copy(&mut counting, &mut io::sink())?;

    Ok(Report {
        bytes: counting.count(),
        millis: started.elapsed().as_millis(),
        ..Report::default()
    })
}
