use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub fn read_input(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Writes `value` as pretty JSON to `dir/file_name`, creating `dir` as needed.
pub fn write_json<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

/// File stem used for a repository's dump and artifact (`MCPs/x` -> `MCPs_x`).
pub fn repo_file_stem(repo: &str) -> String {
    repo.replace('/', "_")
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
