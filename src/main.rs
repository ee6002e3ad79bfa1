use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use htsfetch::client::{download_with_retries, format_url};
use htsfetch::config::Configuration;
use htsfetch::query::Query;
use htsfetch::{ClientOptions, Config, TicketClient, report};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries payload bytes.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let endpoint_url = match (&config.endpoint_url, &config.endpoint_name) {
        (Some(url), _) => Some(url.clone()),
        (None, Some(name)) => {
            let configuration = Configuration::load(&config.configuration)?;
            let provider = configuration
                .providers
                .get(name)
                .with_context(|| format!("unknown endpoint name: {name}"))?;
            Some(provider.base.clone())
        }
        (None, None) => None,
    };

    let client = TicketClient::new(ClientOptions {
        buffer_size: config.buffer_size,
        print_ticket: config.print_ticket,
        timeout: config.timeout.map(Duration::from_secs),
    });

    let Some(base) = endpoint_url else {
        // No endpoint requested: run the diagnostics sweep instead.
        let configuration = Configuration::load(&config.configuration)?;
        report::run(&configuration, &client);
        return Ok(());
    };

    let dataset_id = config
        .dataset_id
        .clone()
        .context("--dataset-id is required")?;
    let query = match config.query.clone() {
        Some(query) => query,
        None => Query {
            reference_name: config
                .reference_name
                .clone()
                .context("--reference-name or --query is required")?,
            start: config.alignment_start,
            end: config.alignment_stop,
        },
    };

    let url = format_url(&base, &dataset_id, &query, config.format);
    tracing::debug!("query url: {url}");

    let bytes = download_with_retries(
        &client,
        &url,
        config.output_file.as_deref(),
        config.retries,
    )?;
    tracing::info!("received {bytes} bytes");
    Ok(())
}
