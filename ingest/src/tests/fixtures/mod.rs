use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::archive::{ArchiveKey, ArchiveStore};
use crate::interval::MonthWindow;
use crate::source::{PageResponse, PageSource};

pub const TEST_KEY_PEM: &str = include_str!("test_key.pem");

/// Load a CSV page fixture by name
pub fn load_page_fixture(fixture_name: &str) -> String {
    let path = Path::new("src/tests/fixtures").join(format!("{}.csv", fixture_name));
    fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {}", fixture_name))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// CSV body with a header and `rows` data lines.
pub fn csv_page(rows: usize) -> String {
    let mut body = String::from("unique_key,created_date\n");
    for i in 0..rows {
        body.push_str(&format!("{},2024-01-01T00:00:00.000\n", 1000 + i));
    }
    body
}

/// Archive store kept in memory. Records every existence check.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: RefCell<BTreeMap<String, String>>,
    pub exists_checks: RefCell<Vec<String>>,
    pub fail_uploads: bool,
}

impl MemoryStore {
    pub fn with_objects(keys: &[ArchiveKey]) -> Self {
        let store = MemoryStore::default();
        for key in keys {
            store
                .objects
                .borrow_mut()
                .insert(key.to_string(), String::new());
        }
        store
    }

    pub fn failing_uploads() -> Self {
        MemoryStore {
            fail_uploads: true,
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.borrow().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.objects.borrow().get(key).cloned()
    }
}

impl ArchiveStore for MemoryStore {
    fn exists(&self, key: &ArchiveKey) -> Result<bool> {
        self.exists_checks.borrow_mut().push(key.to_string());
        Ok(self.objects.borrow().contains_key(key.as_str()))
    }

    fn upload_file(&self, key: &ArchiveKey, path: &Path) -> Result<()> {
        if self.fail_uploads {
            return Err(anyhow::anyhow!("upload rejected for {}", key));
        }
        let contents = fs::read_to_string(path)?;
        self.objects
            .borrow_mut()
            .insert(key.to_string(), contents);
        Ok(())
    }
}

pub enum ScriptedPage {
    Response(PageResponse),
    TransportError,
}

/// Page source answering from a script keyed by `(window start, offset)`.
/// Unscripted positions answer with a header-only page.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<(NaiveDate, u64), ScriptedPage>,
    pub requests: RefCell<Vec<(MonthWindow, u64, u64)>>,
}

impl ScriptedSource {
    pub fn page(mut self, window_start: NaiveDate, offset: u64, body: &str) -> Self {
        self.pages.insert(
            (window_start, offset),
            ScriptedPage::Response(PageResponse {
                status: 200,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn status(mut self, window_start: NaiveDate, offset: u64, status: u16) -> Self {
        self.pages.insert(
            (window_start, offset),
            ScriptedPage::Response(PageResponse {
                status,
                body: "{\"error\": true}".to_string(),
            }),
        );
        self
    }

    pub fn transport_error(mut self, window_start: NaiveDate, offset: u64) -> Self {
        self.pages
            .insert((window_start, offset), ScriptedPage::TransportError);
        self
    }

    /// Offsets requested for the window starting at `window_start`, in order.
    pub fn offsets_for(&self, window_start: NaiveDate) -> Vec<u64> {
        self.requests
            .borrow()
            .iter()
            .filter(|(window, _, _)| window.start == window_start)
            .map(|(_, offset, _)| *offset)
            .collect()
    }
}

impl PageSource for ScriptedSource {
    fn fetch_page(&self, window: &MonthWindow, offset: u64, limit: u64) -> Result<PageResponse> {
        self.requests.borrow_mut().push((*window, offset, limit));
        match self.pages.get(&(window.start, offset)) {
            Some(ScriptedPage::Response(response)) => Ok(response.clone()),
            Some(ScriptedPage::TransportError) => {
                Err(anyhow::anyhow!("operation timed out"))
            }
            None => Ok(PageResponse {
                status: 200,
                body: load_page_fixture("page_header_only"),
            }),
        }
    }
}
