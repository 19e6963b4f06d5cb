use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::interval::MonthWindow;

/// Raw result of one page request. Non-200 statuses are not errors at this
/// level; the fetch loop decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Remote dataset paged by `limit`/`offset`.
pub trait PageSource {
    /// An `Err` means the request never produced a response (connect failure,
    /// timeout, unreadable body).
    fn fetch_page(&self, window: &MonthWindow, offset: u64, limit: u64) -> Result<PageResponse>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch_page(&self, window: &MonthWindow, offset: u64, limit: u64) -> Result<PageResponse> {
        (**self).fetch_page(window, offset, limit)
    }
}

/// Socrata (SODA) resource endpoint returning CSV with a header row.
pub struct SodaSource {
    client: Client,
    base_url: String,
    date_field: String,
}

impl SodaSource {
    pub fn new(base_url: &str, date_field: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(SodaSource {
            client,
            base_url: base_url.to_string(),
            date_field: date_field.to_string(),
        })
    }
}

impl PageSource for SodaSource {
    fn fetch_page(&self, window: &MonthWindow, offset: u64, limit: u64) -> Result<PageResponse> {
        let where_clause = window.where_clause(&self.date_field);
        log::debug!(
            "GET {} $where={} $limit={} $offset={}",
            self.base_url,
            where_clause,
            limit,
            offset
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("$where", where_clause),
                ("$limit", limit.to_string()),
                ("$offset", offset.to_string()),
            ])
            .send()
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        let body = response.text().context("Failed to get response text")?;

        Ok(PageResponse { status, body })
    }
}
