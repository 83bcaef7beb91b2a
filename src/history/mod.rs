//! Cross-session reflection history.
//!
//! Reflection summaries are dated markdown files
//! (`history/reflections/YYYY-MM-DD-topic.md`). Loading parses each one and
//! ranks keywords so recurring problems stand out across sessions.

pub mod note;
pub mod parser;
pub mod themes;

pub use note::{write_note, ReflectionDraft};
pub use parser::{parse_reflection, Reflection};
pub use themes::{analyze_themes, ThemeSummary};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("No reflection files found in {}", .0.display())]
    NoReflections(PathBuf),
    #[error("Invalid reflections path {0}: {1}")]
    Pattern(String, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    pub timestamp: DateTime<Local>,
    pub reflections_dir: String,
    pub total_reflections: usize,
    /// Newest first
    pub reflections: Vec<Reflection>,
    pub recurring_themes: ThemeSummary,
}

/// `*.md` files in `dir`, newest (highest file name) first
pub fn reflection_files(dir: &Path) -> Result<Vec<PathBuf>, HistoryError> {
    if !dir.is_dir() {
        return Err(HistoryError::DirectoryNotFound(dir.to_path_buf()));
    }

    let pattern = format!("{}/*.md", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| HistoryError::Pattern(pattern.clone(), e.to_string()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .collect();
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(files)
}

/// Load and analyze every reflection in `dir`
pub fn load_history(dir: &Path) -> Result<HistoryReport, HistoryError> {
    let files = reflection_files(dir)?;
    if files.is_empty() {
        return Err(HistoryError::NoReflections(dir.to_path_buf()));
    }

    let reflections: Vec<Reflection> = files
        .iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(content) => Some(parse_reflection(path, &content)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable reflection");
                None
            }
        })
        .collect();
    debug!(count = reflections.len(), dir = %dir.display(), "Parsed reflections");

    let recurring_themes = analyze_themes(&reflections);

    Ok(HistoryReport {
        timestamp: Local::now(),
        reflections_dir: dir.display().to_string(),
        total_reflections: reflections.len(),
        reflections,
        recurring_themes,
    })
}
