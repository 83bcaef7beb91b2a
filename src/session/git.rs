//! Git activity: recent commits, diff stats and working tree status.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::runner::CommandRunner;

/// Field separator for `git log` output; cannot appear in a commit subject
const FIELD_SEP: char = '\u{1f}';
const LOG_FORMAT: &str = "--pretty=format:%x1f%H%x1f%s%x1f%an%x1f%ar";
const SHORT_HASH_LEN: usize = 8;
const NO_EXTENSION: &str = "(no ext)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub hash: String,
    pub message: String,
    pub author: String,
    /// Relative date as git prints it ("2 hours ago")
    pub when: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub total_files: usize,
    pub by_extension: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub state: String,
    pub file: String,
}

impl StatusEntry {
    /// Path the file has now (destination of a rename)
    pub fn current_path(&self) -> &str {
        match self.file.split_once(" -> ") {
            Some((_, new)) => new.trim(),
            None => self.file.trim(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitActivity {
    pub available: bool,
    pub branch: String,
    pub commits: Vec<CommitSummary>,
    pub diff_stats: Option<DiffStats>,
    pub status: Vec<StatusEntry>,
}

/// Collect git activity. A directory outside any repository yields
/// `available: false` rather than an error.
pub fn gather_git(runner: &dyn CommandRunner, commits: usize, diff_window: usize) -> GitActivity {
    let mut activity = GitActivity::default();

    if let Err(e) = runner.run("git", &["rev-parse", "--git-dir"]) {
        debug!(error = %e, "Git not available");
        return activity;
    }
    activity.available = true;

    if let Ok(branch) = runner.run("git", &["branch", "--show-current"]) {
        activity.branch = branch;
    }

    let limit = format!("-{}", commits);
    match runner.run("git", &["log", &limit, LOG_FORMAT, "--name-only"]) {
        Ok(out) => activity.commits = parse_log(&out),
        // Fresh repositories have no HEAD yet
        Err(e) => debug!(error = %e, "git log failed"),
    }

    let window = diff_window
        .min(commits)
        .min(activity.commits.len().saturating_sub(1));
    if window > 0 {
        let range = format!("HEAD~{}..HEAD", window);
        match runner.run("git", &["diff", "--stat", &range]) {
            Ok(out) if !out.is_empty() => activity.diff_stats = Some(parse_diff_stat(&out)),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "git diff --stat failed"),
        }
    }

    match runner.run("git", &["status", "--porcelain"]) {
        Ok(out) => activity.status = parse_status(&out),
        Err(e) => debug!(error = %e, "git status failed"),
    }

    activity
}

/// Parse `git log` output produced with [`LOG_FORMAT`] and `--name-only`
pub fn parse_log(output: &str) -> Vec<CommitSummary> {
    let mut commits: Vec<CommitSummary> = Vec::new();

    for line in output.lines() {
        if line.contains(FIELD_SEP) {
            let header = line.trim_start_matches(FIELD_SEP);
            let parts: Vec<&str> = header.splitn(4, FIELD_SEP).collect();
            if parts.len() == 4 {
                commits.push(CommitSummary {
                    hash: parts[0].chars().take(SHORT_HASH_LEN).collect(),
                    message: parts[1].to_string(),
                    author: parts[2].to_string(),
                    when: parts[3].to_string(),
                    files: Vec::new(),
                });
            }
            continue;
        }

        let file = line.trim();
        if file.is_empty() {
            continue;
        }
        if let Some(current) = commits.last_mut() {
            current.files.push(file.to_string());
        }
    }

    commits
}

/// Parse `git diff --stat` output, counting files per extension.
/// The trailing "N files changed" summary line has no `|` and is skipped.
pub fn parse_diff_stat(output: &str) -> DiffStats {
    let mut stats = DiffStats::default();

    for line in output.lines() {
        let Some((name, _)) = line.split_once('|') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        *stats
            .by_extension
            .entry(extension_of(name))
            .or_insert(0) += 1;
        stats.total_files += 1;
    }

    stats
}

fn extension_of(name: &str) -> String {
    // Renames show up as "{old => new}" or "old => new"; classify the new name
    let name = name
        .rsplit("=> ")
        .next()
        .unwrap_or(name)
        .trim_end_matches('}');
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

/// Parse `git status --porcelain` output
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| StatusEntry {
            state: line.get(..2).unwrap_or(line).trim().to_string(),
            file: line.get(3..).unwrap_or("").to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::scripted::ScriptedRunner;
    use crate::runner::CommandError;

    fn log_line(hash: &str, subject: &str, author: &str, when: &str) -> String {
        format!("\u{1f}{hash}\u{1f}{subject}\u{1f}{author}\u{1f}{when}")
    }

    #[test]
    fn test_parse_log_groups_files_under_commits() {
        let output = [
            log_line(
                "0123456789abcdef",
                "Fix parser | handle pipes",
                "Ada",
                "2 hours ago",
            ),
            "src/parser.rs".to_string(),
            "README.md".to_string(),
            String::new(),
            log_line("fedcba9876543210", "Initial commit", "Bob", "3 days ago"),
            "Cargo.toml".to_string(),
        ]
        .join("\n");

        let commits = parse_log(&output);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "01234567");
        assert_eq!(commits[0].message, "Fix parser | handle pipes");
        assert_eq!(commits[0].files, vec!["src/parser.rs", "README.md"]);
        assert_eq!(commits[1].author, "Bob");
        assert_eq!(commits[1].when, "3 days ago");
        assert_eq!(commits[1].files, vec!["Cargo.toml"]);
    }

    #[test]
    fn test_parse_log_ignores_files_before_first_header() {
        let commits = parse_log("stray.txt\n");
        assert!(commits.is_empty());
    }

    #[test]
    fn test_parse_diff_stat() {
        let output = " src/lib.rs       | 10 +++++-----
 src/main.rs      |  2 +-
 Makefile         |  1 +
 docs/{a.txt => b.md} | 0
 4 files changed, 7 insertions(+), 6 deletions(-)";
        let stats = parse_diff_stat(output);
        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.by_extension.get(".rs"), Some(&2));
        assert_eq!(stats.by_extension.get("(no ext)"), Some(&1));
        assert_eq!(stats.by_extension.get(".md"), Some(&1));
    }

    #[test]
    fn test_parse_status_and_renames() {
        let entries = parse_status(" M src/lib.rs\n?? notes.md\nR  old.rs -> new.rs\n");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].state, "M");
        assert_eq!(entries[0].file, "src/lib.rs");
        assert_eq!(entries[1].state, "??");
        assert_eq!(entries[2].current_path(), "new.rs");
    }

    #[test]
    fn test_gather_outside_repository() {
        let runner = ScriptedRunner::new(".").fail(
            "git rev-parse --git-dir",
            CommandError::Failed {
                program: "git".into(),
                code: Some(128),
                stderr: "not a git repository".into(),
            },
        );
        let activity = gather_git(&runner, 20, 5);
        assert!(!activity.available);
        assert!(activity.commits.is_empty());
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn test_gather_clamps_diff_window_to_history() {
        let log = [
            log_line("aaaaaaaaaaaa", "second", "Ada", "1 minute ago"),
            "a.rs".to_string(),
            String::new(),
            log_line("bbbbbbbbbbbb", "first", "Ada", "2 minutes ago"),
            "b.py".to_string(),
        ]
        .join("\n");
        let runner = ScriptedRunner::new(".")
            .reply("git rev-parse --git-dir", ".git")
            .reply("git branch --show-current", "main")
            .reply(&format!("git log -20 {} --name-only", LOG_FORMAT), &log)
            .reply("git diff --stat HEAD~1..HEAD", " a.rs | 1 +\n 1 file changed")
            .reply("git status --porcelain", "");

        let activity = gather_git(&runner, 20, 5);
        assert!(activity.available);
        assert_eq!(activity.branch, "main");
        assert_eq!(activity.commits.len(), 2);
        let stats = activity.diff_stats.unwrap();
        assert_eq!(stats.total_files, 1);
        assert!(activity.status.is_empty());
    }

    #[test]
    fn test_gather_single_commit_skips_diff() {
        let log = log_line("cccccccccccc", "only", "Ada", "now");
        let runner = ScriptedRunner::new(".")
            .reply("git rev-parse --git-dir", ".git")
            .reply("git branch --show-current", "main")
            .reply(&format!("git log -20 {} --name-only", LOG_FORMAT), &log)
            .reply("git status --porcelain", "?? new.txt");

        let activity = gather_git(&runner, 20, 5);
        assert!(activity.diff_stats.is_none());
        assert!(!runner
            .calls
            .borrow()
            .iter()
            .any(|c| c.starts_with("git diff")));
        assert_eq!(activity.status[0].file, "new.txt");
    }
}
