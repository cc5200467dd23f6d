use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Read a JSON board description from disk.
pub fn read_board_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading board file {}", path.display()))
}
