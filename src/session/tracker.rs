//! Issue tracker (beads) status.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::runner::{CommandError, CommandRunner};

/// One issue as the tracker reports it. Fields beyond id/title/status are
/// kept verbatim since the tracker owns that schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerIssue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `null` becomes empty and numbers keep their JSON text, so one odd issue
/// cannot discard the whole list
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerActivity {
    pub available: bool,
    pub closed: Vec<TrackerIssue>,
    pub in_progress: Vec<TrackerIssue>,
    pub open: Vec<TrackerIssue>,
}

/// Query the tracker for closed, in-progress and open issues.
///
/// The tracker is available only when its data directory exists and the
/// command can be started; otherwise an empty activity is returned.
pub fn gather_tracker(runner: &dyn CommandRunner, config: &TrackerConfig) -> TrackerActivity {
    let mut activity = TrackerActivity::default();

    let data_dir = runner.working_dir().join(config.data_dir());
    if !data_dir.exists() {
        debug!(dir = %data_dir.display(), "Tracker data directory not found");
        return activity;
    }

    let (program, base_args) = match config.command_line() {
        Ok(parts) => parts,
        Err(e) => {
            warn!(error = %e, "Tracker command unusable");
            return activity;
        }
    };

    let closed_limit = format!("--limit={}", config.closed_limit());
    let open_limit = format!("--limit={}", config.open_limit());
    let queries: [(&str, Option<&str>); 3] = [
        ("--status=closed", Some(closed_limit.as_str())),
        ("--status=in_progress", None),
        ("--status=open", Some(open_limit.as_str())),
    ];

    let mut results = Vec::with_capacity(queries.len());
    for (status, limit) in queries {
        let mut args: Vec<&str> = base_args.iter().map(String::as_str).collect();
        args.extend(["list", status]);
        args.extend(limit);
        args.push("--json");

        match runner.run(&program, &args) {
            Ok(out) => results.push(parse_issue_list(&out)),
            Err(CommandError::NotFound(_)) => {
                debug!(program = %program, "Tracker command not installed");
                return activity;
            }
            Err(e) => {
                warn!(error = %e, status, "Tracker query failed");
                results.push(Vec::new());
            }
        }
    }

    activity.available = true;
    let mut results = results.into_iter();
    activity.closed = results.next().unwrap_or_default();
    activity.in_progress = results.next().unwrap_or_default();
    activity.open = results.next().unwrap_or_default();
    activity
}

/// Parse `list --json` output; anything other than a JSON array of objects
/// yields an empty list.
pub fn parse_issue_list(output: &str) -> Vec<TrackerIssue> {
    if output.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<TrackerIssue>>(output) {
        Ok(issues) => issues,
        Err(e) => {
            warn!(error = %e, "Tracker output was not a JSON issue list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::scripted::ScriptedRunner;

    #[test]
    fn test_parse_issue_list_keeps_extra_fields() {
        let issues = parse_issue_list(
            r#"[{"id":"bd-1","title":"Fix login","status":"open","priority":1}]"#,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "bd-1");
        assert_eq!(issues[0].extra.get("priority"), Some(&Value::from(1)));
    }

    #[test]
    fn test_null_fields_do_not_drop_the_list() {
        let issues = parse_issue_list(
            r#"[{"id":"bd-1","title":"ok","status":"open"},
                {"id":"bd-2","title":null,"status":"open"},
                {"id":7,"status":"closed"}]"#,
        );
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[1].id, "bd-2");
        assert_eq!(issues[1].title, "");
        assert_eq!(issues[2].id, "7");
        assert_eq!(issues[2].title, "");
    }

    #[test]
    fn test_parse_issue_list_rejects_garbage() {
        assert!(parse_issue_list("").is_empty());
        assert!(parse_issue_list("No issues found.").is_empty());
        assert!(parse_issue_list(r#"{"id":"bd-1"}"#).is_empty());
    }

    #[test]
    fn test_missing_data_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(dir.path());
        let activity = gather_tracker(&runner, &TrackerConfig::default());
        assert!(!activity.available);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_command_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".beads")).unwrap();
        let runner = ScriptedRunner::new(dir.path()).fail(
            "bd list --status=closed --limit=10 --json",
            CommandError::NotFound("bd".into()),
        );
        let activity = gather_tracker(&runner, &TrackerConfig::default());
        assert!(!activity.available);
    }

    #[test]
    fn test_gather_all_statuses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".beads")).unwrap();
        let runner = ScriptedRunner::new(dir.path())
            .reply(
                "bd list --status=closed --limit=3 --json",
                r#"[{"id":"bd-1","title":"a","status":"closed"}]"#,
            )
            .reply(
                "bd list --status=in_progress --json",
                r#"[{"id":"bd-2","title":"b","status":"in_progress"}]"#,
            )
            .reply("bd list --status=open --limit=10 --json", "not json");

        let config = TrackerConfig {
            closed_limit: Some(3),
            ..Default::default()
        };
        let activity = gather_tracker(&runner, &config);
        assert!(activity.available);
        assert_eq!(activity.closed[0].id, "bd-1");
        assert_eq!(activity.in_progress[0].status, "in_progress");
        assert!(activity.open.is_empty());
    }

    #[test]
    fn test_failed_query_keeps_tracker_available() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".beads")).unwrap();
        let runner = ScriptedRunner::new(dir.path())
            .reply(
                "bd list --status=closed --limit=10 --json",
                r#"[{"id":"bd-1","title":"a","status":"closed"}]"#,
            )
            .fail(
                "bd list --status=in_progress --json",
                CommandError::Failed {
                    program: "bd".into(),
                    code: Some(1),
                    stderr: "database locked".into(),
                },
            )
            .reply(
                "bd list --status=open --limit=10 --json",
                r#"[{"id":"bd-3","title":"c","status":"open"}]"#,
            );

        let activity = gather_tracker(&runner, &TrackerConfig::default());
        assert!(activity.available);
        assert_eq!(activity.closed.len(), 1);
        assert!(activity.in_progress.is_empty());
        assert_eq!(activity.open[0].id, "bd-3");
        assert_eq!(runner.calls.borrow().len(), 3);
    }
}
