//! Human-readable summaries. `--json` bypasses all of this.

use std::fmt::Write as _;

use crate::check::PackageReport;
use crate::gather::{GatherBundle, HistoryOutcome};
use crate::history::HistoryReport;
use crate::permissions::{PermissionsReport, SettingsPermissions};
use crate::session::SessionReport;

const RULE_WIDTH: usize = 60;
const JSON_HINT: &str = "Run with --json for full structured output";

fn banner(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{rule}\n{title}\n{rule}");
}

/// First `max` chars, with an ellipsis when cut
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn list_capped(out: &mut String, items: &[String], cap: usize, indent: &str) {
    for item in items.iter().take(cap) {
        let _ = writeln!(out, "{indent}- {item}");
    }
    if items.len() > cap {
        let _ = writeln!(out, "{indent}... and {} more", items.len() - cap);
    }
}

pub fn session_summary(report: &SessionReport) -> String {
    let mut out = String::new();
    banner(&mut out, "SESSION DATA SUMMARY");
    let _ = writeln!(out, "Timestamp: {}", report.timestamp.to_rfc3339());
    let _ = writeln!(out);

    let git = &report.git;
    if git.available {
        let _ = writeln!(out, "Git Branch: {}", git.branch);
        let _ = writeln!(out, "Recent Commits: {}", git.commits.len());
        if !git.commits.is_empty() {
            let _ = writeln!(out, "  Latest commits:");
            for c in git.commits.iter().take(5) {
                let _ = writeln!(out, "    - {}: {}", c.hash, clip(&c.message, 50));
            }
        }
        let _ = writeln!(out, "Files in Status: {}", git.status.len());
        if let Some(stats) = &git.diff_stats {
            let _ = writeln!(out, "Files Changed (recent commits): {}", stats.total_files);
        }
    } else {
        let _ = writeln!(out, "Git: Not available (not in a git repository)");
    }
    let _ = writeln!(out);

    let tracker = &report.tracker;
    if tracker.available {
        let _ = writeln!(out, "Issues Closed: {}", tracker.closed.len());
        let _ = writeln!(out, "Issues In Progress: {}", tracker.in_progress.len());
        let _ = writeln!(out, "Issues Open: {}", tracker.open.len());
    } else {
        let _ = writeln!(out, "Issue tracker: Not available (command or data directory not found)");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Files Edited: {}", report.files_edited.len());
    list_capped(&mut out, &report.files_edited, 10, "  ");
    let _ = writeln!(out);
    let _ = writeln!(out, "{JSON_HINT}");
    out
}

pub fn history_summary(report: &HistoryReport) -> String {
    let mut out = String::new();
    banner(&mut out, "REFLECTION HISTORY SUMMARY");
    let _ = writeln!(out, "Directory: {}", report.reflections_dir);
    let _ = writeln!(out, "Total Reflections: {}", report.total_reflections);
    let _ = writeln!(out);

    let _ = writeln!(out, "Recent Reflections:");
    for r in report.reflections.iter().take(5) {
        let _ = writeln!(out, "  - {}: {}", r.date, r.topic);
        if !r.summary.is_empty() {
            let _ = writeln!(out, "    {}", clip(&r.summary, 60));
        }
    }
    let _ = writeln!(out);

    let themes = &report.recurring_themes;
    let _ = writeln!(out, "Recurring Themes (mentioned 2+ times across sessions):");
    for theme in themes.recurring_across_sessions.iter().take(10) {
        let recent = &theme.dates[theme.dates.len().saturating_sub(3)..];
        let _ = writeln!(
            out,
            "  - {}: {} mentions ({})",
            theme.keyword,
            theme.count,
            recent.join(", ")
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Top Discovery Keywords:");
    for kc in themes.discovery_keywords.iter().take(8) {
        let _ = writeln!(out, "  - {}: {}", kc.keyword, kc.count);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Open Question Keywords (potential recurring issues):");
    for kc in themes.question_keywords.iter().take(5) {
        let _ = writeln!(out, "  - {}: {}", kc.keyword, kc.count);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{JSON_HINT}");
    out
}

fn settings_block(out: &mut String, label: &str, settings: &SettingsPermissions) {
    let _ = writeln!(out, "{label}: {}", settings.settings_path);
    let _ = writeln!(out, "  Exists: {}", settings.exists);
    if settings.exists {
        if let Some(mode) = settings.default_mode {
            let _ = writeln!(out, "  Default mode: {}", mode.as_str());
        }
        let _ = writeln!(out, "  Permissions: {}", settings.current_permissions.len());
        list_capped(out, &settings.current_permissions, 10, "    ");
        if !settings.denied_patterns.is_empty() {
            let _ = writeln!(out, "  Denied: {}", settings.denied_patterns.len());
        }
    }
    let _ = writeln!(out);
}

pub fn permissions_summary(report: &PermissionsReport) -> String {
    let mut out = String::new();
    banner(&mut out, "PERMISSIONS SUMMARY");
    let _ = writeln!(out);
    settings_block(&mut out, "Project Settings", &report.project_settings);
    if let Some(home) = &report.home_settings {
        settings_block(&mut out, "Home Settings", home);
    }

    let _ = writeln!(out, "Bash Command Patterns:");
    for pattern in report.combined_bash_patterns.iter().take(15) {
        let _ = writeln!(out, "  - {pattern}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "MCP Tool Permissions:");
    for perm in report.combined_mcp().iter().take(10) {
        let _ = writeln!(out, "  - {perm}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{JSON_HINT}");
    out
}

pub fn package_summary(report: &PackageReport) -> String {
    let mut out = String::new();
    banner(&mut out, "PACKAGE CHECK");
    let _ = writeln!(out, "Root: {}", report.root);
    let _ = writeln!(
        out,
        "Plugins: {}  Skills: {}",
        report.plugins_checked, report.skills_checked
    );
    let _ = writeln!(out);
    for f in &report.findings {
        let _ = writeln!(out, "{}: {}: {}", f.severity, f.location, f.message);
    }
    if !report.findings.is_empty() {
        let _ = writeln!(out);
    }
    let _ = writeln!(
        out,
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    out
}

pub fn bundle_summary(bundle: &GatherBundle) -> String {
    let mut out = session_summary(&bundle.session);
    if let Some(permissions) = &bundle.permissions {
        out.push('\n');
        out.push_str(&permissions_summary(permissions));
    }
    match &bundle.history {
        Some(HistoryOutcome::Loaded(history)) => {
            out.push('\n');
            out.push_str(&history_summary(history));
        }
        Some(HistoryOutcome::Unavailable { error }) => {
            let _ = writeln!(out, "\nHistory: {error}");
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::scripted::ScriptedRunner;
    use crate::session::{gather_session, SessionOptions};

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_session_summary_without_tools() {
        let dir = tempfile::tempdir().unwrap();
        let report = gather_session(&ScriptedRunner::new(dir.path()), &SessionOptions::default());
        let text = session_summary(&report);
        assert!(text.contains("SESSION DATA SUMMARY"));
        assert!(text.contains("Git: Not available"));
        assert!(text.contains("Files Edited: 0"));
        assert!(text.ends_with(&format!("{JSON_HINT}\n")));
    }

    #[test]
    fn test_files_edited_capped() {
        let mut out = String::new();
        let items: Vec<String> = (0..12).map(|i| format!("f{i}.rs")).collect();
        list_capped(&mut out, &items, 10, "  ");
        assert_eq!(out.lines().count(), 11);
        assert!(out.ends_with("  ... and 2 more\n"));
    }
}
