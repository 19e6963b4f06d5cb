pub mod archive;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod interval;
pub mod source;
pub mod store;

#[cfg(test)]
pub mod tests;

use anyhow::Result;

pub use crate::archive::{ArchiveKey, ArchiveStore, ArchiveWriter};
pub use crate::config::IngestConfig;
pub use crate::error::IngestError;
pub use crate::fetcher::{count_rows, ingest_month, MonthOutcome, MonthReport};
pub use crate::interval::{monthly_windows, parse_date, DateRange, MonthWindow};
pub use crate::source::{PageResponse, PageSource, SodaSource};
pub use crate::store::{OpendalStore, ServiceAccountKey};

/// Archive every month of `range` in order.
///
/// A month answered with a non-200 status is logged and the run moves on.
/// Request and storage errors abort the run; months already archived stay
/// archived.
pub fn run_ingestion<P: PageSource, S: ArchiveStore>(
    range: &DateRange,
    source: &P,
    writer: &ArchiveWriter<S>,
    config: &IngestConfig,
) -> Result<Vec<MonthReport>> {
    config.validate()?;

    let windows = monthly_windows(range);
    log::info!(
        "Ingesting {} month(s) from {} to {}",
        windows.len(),
        range.start(),
        range.end()
    );

    let mut reports = Vec::with_capacity(windows.len());
    for window in &windows {
        let report = ingest_month(window, source, writer, config)?;
        if let MonthOutcome::Failed { offset, status } = &report.outcome {
            log::warn!(
                "{} stopped early at offset {} (HTTP {}), continuing with next month",
                window,
                offset,
                status
            );
        }
        reports.push(report);
    }

    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, MonthOutcome::Failed { .. }))
        .count();
    let rows: u64 = reports.iter().map(|r| r.rows).sum();
    log::info!(
        "Ingestion finished: {} rows uploaded, {} of {} month(s) failed",
        rows,
        failed,
        reports.len()
    );

    Ok(reports)
}
