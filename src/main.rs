//! Catalog importer binary
//!
//! Reads a supplier sheet, enriches every record through the configured
//! credentials, and reports what was imported.

#![allow(missing_docs)]

use catalog_forge::ingest::load_backlog;
use catalog_forge::{
    Config, CsvSheetReader, HttpEnrichmentBackend, MemoryCatalogStore, Pipeline,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};

#[derive(Parser, Debug)]
#[command(name = "importer", version, about = "Concurrent catalog enrichment importer")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/importer.yaml", env = "IMPORTER_CONFIG")]
    config: PathBuf,

    /// Path to the supplier sheet (CSV)
    #[arg(short, long)]
    input: PathBuf,

    /// Process the whole sheet even when a previous run is detected
    #[arg(long)]
    no_resume: bool,

    /// Write the enriched catalog to this file as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging system
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    match run_import(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("Import was cancelled before the backlog was finished");
            ExitCode::FAILURE
        }
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_import(cli: Cli) -> anyhow::Result<bool> {
    let mut config = Config::from_file(&cli.config).await?;
    if cli.no_resume {
        config.pipeline.resume = false;
    }

    let reader = CsvSheetReader::new(&cli.input);
    let backlog = load_backlog(&reader)?;
    info!(records = backlog.len(), input = %cli.input.display(), "Sheet ingested");

    let backend = Arc::new(HttpEnrichmentBackend::new(&config.backend)?);
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, backend, Arc::clone(&store) as _)?;

    let summary = pipeline.run(backlog).await?;
    info!(
        imported = summary.imported,
        errors = summary.errors.len(),
        "Importer finished"
    );
    for message in &summary.errors {
        error!(%message, "Condemned record");
    }

    if let Some(path) = &cli.output {
        let records = store.records().await;
        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(path, json).await?;
        info!(output = %path.display(), records = records.len(), "Catalog written");
    }

    Ok(summary.success)
}
