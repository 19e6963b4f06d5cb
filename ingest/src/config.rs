use std::path::PathBuf;
use std::time::Duration;

use crate::error::IngestError;

pub const DEFAULT_BASE_URL: &str = "https://data.cityofnewyork.us/resource/erm2-nwe9.csv";
pub const DEFAULT_PAGE_SIZE: u64 = 50_000;
pub const DEFAULT_BUCKET: &str = "projeto_nyc";
pub const DEFAULT_DATASET: &str = "nyc_311";
pub const DEFAULT_DATE_FIELD: &str = "created_date";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

/// Everything a run needs besides the date range and the credentials.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// SODA resource URL serving the dataset as CSV
    pub base_url: String,
    /// Rows per request, also the offset step
    pub page_size: u64,
    pub bucket: String,
    /// Names both the landing sub-folder and the object file prefix
    pub dataset: String,
    /// Column the monthly `$where` predicate filters on
    pub date_field: String,
    pub fetch_timeout: Duration,
    /// Where pages are staged before upload. `None` means the system temp dir.
    pub staging_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            bucket: DEFAULT_BUCKET.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            date_field: DEFAULT_DATE_FIELD.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            staging_dir: None,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.page_size == 0 {
            // offset would never advance
            return Err(IngestError::Config("page size must be positive".into()));
        }
        if self.dataset.is_empty() || self.dataset.contains('/') {
            return Err(IngestError::Config(format!(
                "dataset name '{}' must be non-empty and contain no '/'",
                self.dataset
            )));
        }
        if self.bucket.is_empty() {
            return Err(IngestError::Config("bucket name must be non-empty".into()));
        }
        if self.date_field.is_empty() {
            return Err(IngestError::Config("date field must be non-empty".into()));
        }
        Ok(())
    }
}
