use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid date '{input}', expected dd/mm/yyyy")]
    InvalidDate { input: String },

    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    #[error("Storage operation on '{object}' failed: {source}")]
    Storage {
        object: String,
        #[source]
        source: opendal::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
