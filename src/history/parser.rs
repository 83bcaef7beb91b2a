//! Reflection summary parser.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static DATED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").expect("dated file name pattern is valid")
});

/// Summary section title; plain lines inside it become the summary
pub const SUMMARY_SECTION: &str = "session summary";

/// One parsed reflection file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub file: String,
    pub date: String,
    pub topic: String,
    pub summary: String,
    pub discoveries: Vec<String>,
    pub improvements_made: Vec<String>,
    pub issues_created: Vec<String>,
    pub open_questions: Vec<String>,
    pub patterns_to_watch: Vec<String>,
    pub anti_patterns: Vec<String>,
}

/// Which reflection list a `## ` section feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Discoveries,
    ImprovementsMade,
    IssuesCreated,
    OpenQuestions,
    PatternsToWatch,
    AntiPatterns,
}

impl SectionKind {
    /// Classify a section title. Order matters: "Anti-Patterns" is checked
    /// before the generic "pattern" rule, "Patterns Discovered" is a
    /// discovery and "Patterns to Watch" is not.
    pub fn classify(title: &str) -> Option<Self> {
        let t = title.to_lowercase();
        let has = |s: &str| t.contains(s);

        if has("anti") {
            Some(Self::AntiPatterns)
        } else if has("discover") || (has("pattern") && !has("watch")) {
            Some(Self::Discoveries)
        } else if has("improvement") && has("made") {
            Some(Self::ImprovementsMade)
        } else if has("issue") || has("created") {
            Some(Self::IssuesCreated)
        } else if has("question") {
            Some(Self::OpenQuestions)
        } else if has("watch") || has("pattern") {
            Some(Self::PatternsToWatch)
        } else {
            None
        }
    }
}

impl Reflection {
    fn list_mut(&mut self, kind: SectionKind) -> &mut Vec<String> {
        match kind {
            SectionKind::Discoveries => &mut self.discoveries,
            SectionKind::ImprovementsMade => &mut self.improvements_made,
            SectionKind::IssuesCreated => &mut self.issues_created,
            SectionKind::OpenQuestions => &mut self.open_questions,
            SectionKind::PatternsToWatch => &mut self.patterns_to_watch,
            SectionKind::AntiPatterns => &mut self.anti_patterns,
        }
    }
}

/// Split a file stem of the form `YYYY-MM-DD-topic-words` into date and topic
pub fn split_file_stem(stem: &str) -> (String, String) {
    match DATED_NAME.captures(stem) {
        Some(caps) => (caps[1].to_string(), caps[2].replace('-', " ")),
        None => (String::new(), stem.to_string()),
    }
}

/// Parse reflection markdown. `path` only supplies the file name metadata.
pub fn parse_reflection(path: &Path, content: &str) -> Reflection {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (date, topic) = split_file_stem(&stem);

    let mut reflection = Reflection {
        file: path.display().to_string(),
        date,
        topic,
        ..Default::default()
    };

    let mut section: Option<String> = None;
    let mut items: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if let Some(title) = line.strip_prefix("## ") {
            flush(&mut reflection, section.as_deref(), &mut items);
            section = Some(title.trim().to_lowercase());
        } else if line.starts_with("### ") {
            // Subsections continue the enclosing section
        } else if let Some(item) = line.strip_prefix("- ") {
            let item = item.trim();
            let item = item
                .strip_prefix("[x]")
                .or_else(|| item.strip_prefix("[ ]"))
                .map(str::trim)
                .unwrap_or(item);
            if !item.is_empty() {
                items.push(item.to_string());
            }
        } else if !line.is_empty() && section.as_deref() == Some(SUMMARY_SECTION) {
            reflection.summary = line.to_string();
        }
    }
    flush(&mut reflection, section.as_deref(), &mut items);

    reflection
}

fn flush(reflection: &mut Reflection, section: Option<&str>, items: &mut Vec<String>) {
    if items.is_empty() {
        return;
    }
    match section.and_then(SectionKind::classify) {
        Some(kind) => reflection.list_mut(kind).append(items),
        None => items.clear(),
    }
}
