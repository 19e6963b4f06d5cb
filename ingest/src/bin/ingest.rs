use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nyc311_ingest::{
    parse_date, run_ingestion, ArchiveWriter, DateRange, IngestConfig, OpendalStore, SodaSource,
};

/// Archive NYC 311 service requests month by month into Cloud Storage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// First day of the period, dd/mm/yyyy
    #[arg(long)]
    start_date: String,

    /// End of the period (exclusive), dd/mm/yyyy
    #[arg(long)]
    end_date: String,

    /// Service account JSON key used to access the bucket
    #[arg(long)]
    service_account_path: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = IngestConfig::default();
    config.validate()?;

    let range = DateRange::new(parse_date(&cli.start_date)?, parse_date(&cli.end_date)?)?;

    // credentials are checked before any request goes out
    let store = OpendalStore::gcs(&config.bucket, &cli.service_account_path)
        .with_context(|| format!("Failed to open bucket {}", config.bucket))?;

    let source = SodaSource::new(&config.base_url, &config.date_field, config.fetch_timeout)?;
    log::info!("Archiving {} into {}", config.base_url, store.location());
    let writer = ArchiveWriter::new(store, config.staging_dir.clone());

    run_ingestion(&range, &source, &writer, &config)?;

    Ok(())
}
