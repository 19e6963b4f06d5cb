use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::IngestError;

/// Format accepted on the command line, e.g. `10/12/2023`.
pub const CLI_DATE_FORMAT: &str = "%d/%m/%Y";

/// Caller-supplied span. `start` is inclusive, `end` exclusive when filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, IngestError> {
        if start > end {
            return Err(IngestError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// A [`DateRange`] clipped to a single calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// SoQL predicate selecting rows with `field` in `[start, end)`.
    pub fn where_clause(&self, field: &str) -> String {
        format!(
            "{field} >= \"{}\" AND {field} < \"{}\"",
            self.start.format("%Y-%m-%dT00:00:00"),
            self.end.format("%Y-%m-%dT00:00:00"),
        )
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, IngestError> {
    NaiveDate::parse_from_str(input.trim(), CLI_DATE_FORMAT).map_err(|_| {
        IngestError::InvalidDate {
            input: input.to_string(),
        }
    })
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// `None` only past the last representable year.
fn first_day_of_next_month(month_start: NaiveDate) -> Option<NaiveDate> {
    if month_start.month() == 12 {
        NaiveDate::from_ymd_opt(month_start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month_start.year(), month_start.month() + 1, 1)
    }
}

/// Split `range` into one window per calendar month it touches.
///
/// Windows are ordered, contiguous and never overlap; each one is clipped to
/// the range bounds. A range ending on the first of a month gets a trailing
/// zero-length window for that month, and `start == end` yields one
/// zero-length window.
pub fn monthly_windows(range: &DateRange) -> Vec<MonthWindow> {
    let mut windows = Vec::new();
    let mut month_start = first_day_of_month(range.start);

    while month_start <= range.end {
        let Some(next_month) = first_day_of_next_month(month_start) else {
            break;
        };

        windows.push(MonthWindow {
            start: month_start.max(range.start),
            end: next_month.min(range.end),
        });

        month_start = next_month;
    }

    windows
}
