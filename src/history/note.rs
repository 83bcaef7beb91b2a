//! Writes new reflection summaries in the layout the parser reads back.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use tracing::info;

const MAX_SLUG_LEN: usize = 60;

/// Content for a new reflection summary
#[derive(Debug, Clone)]
pub struct ReflectionDraft {
    pub date: NaiveDate,
    pub topic: String,
    pub summary: String,
    pub discoveries: Vec<String>,
    pub improvements_made: Vec<String>,
    pub issues_created: Vec<String>,
    pub open_questions: Vec<String>,
    pub patterns_to_watch: Vec<String>,
    pub anti_patterns: Vec<String>,
}

impl ReflectionDraft {
    pub fn new(date: NaiveDate, topic: impl Into<String>) -> Self {
        Self {
            date,
            topic: topic.into(),
            summary: String::new(),
            discoveries: Vec::new(),
            improvements_made: Vec::new(),
            issues_created: Vec::new(),
            open_questions: Vec::new(),
            patterns_to_watch: Vec::new(),
            anti_patterns: Vec::new(),
        }
    }

    /// `YYYY-MM-DD-topic-slug.md`
    pub fn file_name(&self) -> Result<String> {
        let slug = slugify(&self.topic);
        if slug.is_empty() {
            bail!("Topic must contain at least one letter or digit");
        }
        Ok(format!("{}-{}.md", self.date.format("%Y-%m-%d"), slug))
    }

    /// Render markdown. Free text is folded onto one line and stripped of
    /// leading list, heading and checkbox markers so it reads back unchanged.
    /// Empty sections get a placeholder checkbox so the template stays
    /// fillable by hand.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Reflection: {}", plain_line(&self.topic));
        let _ = writeln!(out);
        let _ = writeln!(out, "Date: {}", self.date.format("%Y-%m-%d"));
        let _ = writeln!(out);
        let _ = writeln!(out, "## Session Summary");
        let summary = plain_line(&self.summary);
        if !summary.is_empty() {
            let _ = writeln!(out, "{}", summary);
        }

        let sections: [(&str, &[String]); 6] = [
            ("Discoveries", self.discoveries.as_slice()),
            ("Improvements Made", self.improvements_made.as_slice()),
            ("Issues Created", self.issues_created.as_slice()),
            ("Open Questions", self.open_questions.as_slice()),
            ("Patterns to Watch", self.patterns_to_watch.as_slice()),
            ("Anti-Patterns", self.anti_patterns.as_slice()),
        ];
        for (title, items) in sections {
            let items: Vec<String> = items
                .iter()
                .map(|item| plain_line(item))
                .filter(|item| !item.is_empty())
                .collect();

            let _ = writeln!(out);
            let _ = writeln!(out, "## {}", title);
            if items.is_empty() {
                let _ = writeln!(out, "- [ ] ");
            }
            for item in items {
                let _ = writeln!(out, "- {}", item);
            }
        }
        out
    }
}

/// One line of text with no leading `- `, `#` or checkbox markers
pub fn plain_line(text: &str) -> String {
    let mut line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let stripped = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("[x]"))
            .or_else(|| line.strip_prefix("[ ]"))
            .map(str::to_string)
            .or_else(|| line.starts_with('#').then(|| line.trim_start_matches('#').to_string()));
        match stripped {
            Some(rest) => line = rest.trim_start().to_string(),
            None => return line,
        }
    }
}

/// Lowercase, hyphen-separated, ASCII alphanumerics only
pub fn slugify(topic: &str) -> String {
    let mut slug = String::new();
    for c in topic.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    slug.trim_end_matches('-').to_string()
}

/// Write the draft into `dir`, creating it if needed. Never overwrites.
pub fn write_note(dir: &Path, draft: &ReflectionDraft) -> Result<PathBuf> {
    let path = dir.join(draft.file_name()?);

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("Reflection already exists: {}", path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create {}", path.display()))
        }
    };
    file.write_all(draft.render().as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), "Wrote reflection summary");
    Ok(path)
}
