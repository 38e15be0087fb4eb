//! CLI glue for minimal-honeycomb: command parsing and the async [`run`] entrypoint.
//!
//! All request building, pagination and normalisation lives in
//! `minimal-honeycomb-core`; this module only wires a loaded job, the resolved
//! configuration and the HTTP transport together and writes the result.
//!
//! - `fetch` walks every page of the job's request and prints the records as JSON.
//! - `document` is a dry run: it prints the first page's document and variables
//!   without touching the network or needing credentials.

use crate::load_config::load_config;
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use minimal_honeycomb_core::pagination::page_request;
use minimal_honeycomb_core::{ClientConfig, HoneycombClient};
use std::path::PathBuf;

/// CLI for minimal-honeycomb: fetch paginated data from a Honeycomb endpoint.
#[derive(Parser)]
#[clap(
    name = "minimal-honeycomb",
    version,
    about = "Fetch, deduplicate and flatten paginated data from a Honeycomb GraphQL endpoint"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every page of the request described in the job file
    Fetch {
        /// Path to the YAML job file
        #[clap(long)]
        job: PathBuf,
        /// Expand encoded file.data payloads into parsed_data records
        #[clap(long)]
        parse: bool,
        /// Write the JSON result here instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the first page's query document and variables without sending anything
    Document {
        /// Path to the YAML job file
        #[clap(long)]
        job: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Fetch { job, parse, output } => {
            let job = load_config(job)?;
            let config = ClientConfig::from_env()?;
            let transport = HttpTransport::new(config)
                .map_err(|e| anyhow::Error::msg(format!("Failed to construct transport: {e}")))?;
            let client = HoneycombClient::new(transport);

            tracing::info!(command = "fetch", request_name = %job.request.request_name, "Starting fetch");
            let mut records = match client.fetch_data(&job.request).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::error!(command = "fetch", error = %e, "Fetch failed");
                    return Err(e.into());
                }
            };
            if parse || job.parse {
                records = client.parse_datapoints(records);
            }

            let json = serde_json::to_string_pretty(&records)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write output file {:?}", path))?;
                    tracing::info!(command = "fetch", records = records.len(), output = ?path, "Fetch complete");
                }
                None => {
                    println!("{json}");
                    tracing::info!(command = "fetch", records = records.len(), "Fetch complete");
                }
            }
            Ok(())
        }
        Commands::Document { job } => {
            let job = load_config(job)?;
            job.request.validate()?;
            let built = page_request(&job.request, None)?;
            tracing::info!(command = "document", request_name = %job.request.request_name, "Rendering first page");
            print!("{}", built.document);
            println!("{}", built.variables_string()?);
            Ok(())
        }
    }
}
