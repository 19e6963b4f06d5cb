use std::fs;
use std::path::Path;

use crate::config::IngestConfig;

pub mod fixtures;

/// Names of the files currently in a staging directory
pub fn staged_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap_or_else(|_| panic!("Failed to read staging dir: {}", dir.display()))
        .map(|entry| {
            entry
                .unwrap_or_else(|_| panic!("Failed to read entry in: {}", dir.display()))
                .file_name()
                .to_string_lossy()
                .to_string()
        })
        .collect()
}

/// Production config with a small page size and a private staging dir
pub fn test_config(page_size: u64, staging_dir: &Path) -> IngestConfig {
    IngestConfig {
        page_size,
        staging_dir: Some(staging_dir.to_path_buf()),
        ..IngestConfig::default()
    }
}
