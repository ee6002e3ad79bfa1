use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::Result;
use crate::query::{Format, Query};

#[derive(Debug, Clone, Parser)]
#[command(name = "htsfetch")]
#[command(about = "htsget ticket-retrieval client")]
pub struct Config {
    /// YAML document describing providers and available test datasets
    #[arg(long, env = "HTSFETCH_CONFIGURATION", default_value = "configuration.yml")]
    pub configuration: PathBuf,

    /// Endpoint URL to query directly
    #[arg(long, env = "HTSFETCH_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Endpoint name, resolved via the configuration file
    #[arg(long, env = "HTSFETCH_ENDPOINT_NAME")]
    pub endpoint_name: Option<String>,

    /// Dataset id to request
    #[arg(long)]
    pub dataset_id: Option<String>,

    /// Reference sequence name to request
    #[arg(long)]
    pub reference_name: Option<String>,

    /// Genomic query shorthand, name:start-end; replaces --reference-name
    /// and --alignment-start/--alignment-stop
    #[arg(long, conflicts_with_all = ["reference_name", "alignment_start", "alignment_stop"])]
    pub query: Option<Query>,

    /// Alignment start for the genomic query
    #[arg(long, default_value = "0")]
    pub alignment_start: u64,

    /// Alignment end for the genomic query
    #[arg(long, default_value = "0")]
    pub alignment_stop: u64,

    /// Format: bam or cram
    #[arg(long, value_enum, default_value = "bam")]
    pub format: Format,

    /// Output file for received data, omit for stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Print the json ticket before receiving data
    #[arg(long, default_value = "false")]
    pub print_ticket: bool,

    /// Buffer size for downloaded data
    #[arg(long, env = "HTSFETCH_BUFFER_SIZE", default_value = "1048576")]
    pub buffer_size: usize,

    /// Number of tries before declaring failure
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Per-request timeout in seconds, omit for none
    #[arg(long, env = "HTSFETCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Configuration document: named endpoints plus diagnostic query sets.
/// `BTreeMap` keeps diagnostics output deterministic.
#[derive(Debug, Default, Deserialize)]
pub struct Configuration {
    pub providers: BTreeMap<String, Provider>,
    #[serde(default)]
    pub test_queries: BTreeMap<String, Vec<Query>>,
}

#[derive(Debug, Deserialize)]
pub struct Provider {
    /// Base URL queries are appended to.
    pub base: String,
    /// Dataset id -> provider-specific accession.
    #[serde(default)]
    pub accessions: BTreeMap<String, String>,
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Configuration> {
        let file = File::open(path).map_err(crate::Error::from)?;
        Ok(serde_yaml::from_reader(file)?)
    }
}
