use anyhow::{Context, Result};

use crate::archive::{ArchiveKey, ArchiveStore, ArchiveWriter};
use crate::config::IngestConfig;
use crate::interval::MonthWindow;
use crate::source::PageSource;

/// Data rows in a CSV page: newline-delimited lines minus the header.
///
/// Quoted fields containing literal newlines are counted as extra rows.
pub fn count_rows(body: &str) -> u64 {
    let lines = body.trim().split('\n').count() as u64;
    lines.saturating_sub(1)
}

/// How a month's paging loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthOutcome {
    /// An empty or header-only page was returned.
    Exhausted,
    /// The request at `offset` answered with a non-200 status; later offsets
    /// were not attempted.
    Failed { offset: u64, status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthReport {
    pub window: MonthWindow,
    pub pages_written: u64,
    pub pages_skipped: u64,
    pub rows: u64,
    pub outcome: MonthOutcome,
}

enum LoopState {
    Fetching { offset: u64 },
    Done(MonthOutcome),
}

struct MonthRun<'a, P, S> {
    window: &'a MonthWindow,
    source: &'a P,
    writer: &'a ArchiveWriter<S>,
    dataset: &'a str,
    page_size: u64,
    pages_written: u64,
    pages_skipped: u64,
    rows: u64,
}

impl<P: PageSource, S: ArchiveStore> MonthRun<'_, P, S> {
    fn step(&mut self, offset: u64) -> Result<LoopState> {
        let key = ArchiveKey::for_window(self.dataset, self.window, offset);
        let next = LoopState::Fetching {
            offset: offset + self.page_size,
        };

        if self.writer.exists(&key)? {
            log::info!("Already archived | offset {}", offset);
            self.pages_skipped += 1;
            return Ok(next);
        }

        // no response at all aborts the whole run
        let response = self
            .source
            .fetch_page(self.window, offset, self.page_size)
            .with_context(|| format!("Failed to fetch {} at offset {}", self.window, offset))?;

        if !response.is_ok() {
            log::warn!("HTTP error {} | offset {}", response.status, offset);
            return Ok(LoopState::Done(MonthOutcome::Failed {
                offset,
                status: response.status,
            }));
        }

        let rows = count_rows(&response.body);
        if rows == 0 {
            return Ok(LoopState::Done(MonthOutcome::Exhausted));
        }

        self.writer.write_page(&key, &response.body)?;
        log::info!("Uploaded {} rows | offset {}", rows, offset);

        self.pages_written += 1;
        self.rows += rows;
        Ok(next)
    }
}

/// Page through one month starting at offset 0, archiving every non-empty
/// page that is not already in the store.
///
/// A non-200 response ends the month and is reported in the outcome.
/// Transport and storage failures are returned as errors.
pub fn ingest_month<P: PageSource, S: ArchiveStore>(
    window: &MonthWindow,
    source: &P,
    writer: &ArchiveWriter<S>,
    config: &IngestConfig,
) -> Result<MonthReport> {
    log::info!("Processing {}", window);

    let mut run = MonthRun {
        window,
        source,
        writer,
        dataset: &config.dataset,
        page_size: config.page_size,
        pages_written: 0,
        pages_skipped: 0,
        rows: 0,
    };

    let mut state = LoopState::Fetching { offset: 0 };
    let outcome = loop {
        match state {
            LoopState::Fetching { offset } => state = run.step(offset)?,
            LoopState::Done(outcome) => break outcome,
        }
    };

    log::info!("{} finished with {} rows", window, run.rows);

    Ok(MonthReport {
        window: *window,
        pages_written: run.pages_written,
        pages_skipped: run.pages_skipped,
        rows: run.rows,
        outcome,
    })
}
