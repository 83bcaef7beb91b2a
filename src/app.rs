//! Command dispatch shared by the binary and its tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::check::check_package;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::gather::{gather, GatherBundle, GatherSources, ReflectMode};
use crate::history::{load_history, write_note, ReflectionDraft};
use crate::permissions::gather_permissions;
use crate::report;
use crate::runner::SystemRunner;
use crate::session::{gather_session, SessionOptions};

/// How a command finished; mapped to the process exit code by `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Run one parsed command, writing its report to `out`
pub fn execute(cli: Cli, out: &mut dyn Write) -> Result<Outcome> {
    let base = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };
    debug!(dir = %base.display(), "Working directory");

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_in(&base)?,
    };

    let runner = SystemRunner::new(&base).with_timeout(config.session.timeout());

    match cli.command {
        Commands::Session { commits } => {
            let mut options = SessionOptions::from_config(&config.session, &config.tracker);
            if let Some(n) = commits {
                options.commits = n;
            }
            let session = gather_session(&runner, &options);
            emit(out, cli.json, &session, report::session_summary)?;
        }
        Commands::History { reflections_dir } => {
            let dir = resolve(
                &base,
                reflections_dir.unwrap_or_else(|| config.history.reflections_dir()),
            );
            match load_history(&dir) {
                Ok(history) => emit(out, cli.json, &history, report::history_summary)?,
                Err(e) => {
                    // Callers parse stdout, so the error is reported there too
                    writeln!(out, "{}", serde_json::json!({ "error": e.to_string() }))?;
                    return Ok(Outcome::Failure);
                }
            }
        }
        Commands::Permissions {
            settings_path,
            no_home,
        } => {
            let project = resolve(
                &base,
                settings_path.unwrap_or_else(|| config.permissions.settings_path()),
            );
            let home = if no_home {
                None
            } else {
                config.permissions.home_settings_path()
            };
            let permissions = gather_permissions(&project, home.as_deref());
            emit(out, cli.json, &permissions, report::permissions_summary)?;
        }
        Commands::Gather { mode, commits } => {
            let bundle = run_gather(&runner, &config, mode, commits);
            emit(out, cli.json, &bundle, report::bundle_summary)?;
        }
        Commands::Check { root } => {
            let root = resolve(&base, root.unwrap_or_default());
            let package = check_package(&root);
            emit(out, cli.json, &package, report::package_summary)?;
            if !package.is_ok() {
                return Ok(Outcome::Failure);
            }
        }
        Commands::Note {
            topic,
            summary,
            out_dir,
        } => {
            let dir = resolve(
                &base,
                out_dir.unwrap_or_else(|| config.history.reflections_dir()),
            );
            let mut draft = ReflectionDraft::new(chrono::Local::now().date_naive(), topic);
            draft.summary = summary.unwrap_or_default();
            let path = write_note(&dir, &draft)?;
            writeln!(out, "{}", path.display())?;
        }
    }

    Ok(Outcome::Success)
}

fn run_gather(
    runner: &SystemRunner,
    config: &Config,
    mode: ReflectMode,
    commits: Option<usize>,
) -> GatherBundle {
    let mut session = SessionOptions::from_config(&config.session, &config.tracker);
    if let Some(n) = commits {
        session.commits = n;
    }
    let sources = GatherSources {
        session,
        settings_path: config.permissions.settings_path(),
        home_settings_path: config.permissions.home_settings_path(),
        reflections_dir: config.history.reflections_dir(),
    };
    gather(runner, mode, &sources)
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn emit<T: Serialize>(
    out: &mut dyn Write,
    json: bool,
    value: &T,
    summary: fn(&T) -> String,
) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        write!(out, "{}", summary(value))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_in(dir: &Path, args: &[&str]) -> (Outcome, String) {
        let mut argv = vec!["reflect", "-C"];
        let dir = dir.to_string_lossy().into_owned();
        argv.push(&dir);
        argv.extend_from_slice(args);

        let mut out = Vec::new();
        let outcome = execute(Cli::parse_from(argv), &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_history_error_goes_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, out) = run_in(dir.path(), &["history"]);

        assert_eq!(outcome, Outcome::Failure);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Directory not found"));
    }

    #[test]
    fn test_history_uses_project_config_of_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".reflect")).unwrap();
        std::fs::write(
            dir.path().join(".reflect/config.toml"),
            "[history]\nreflections_dir = \"notes\"\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(
            dir.path().join("notes/2025-02-01-cleanup.md"),
            "## Session Summary\nTidied up.\n",
        )
        .unwrap();

        let (outcome, out) = run_in(dir.path(), &["--json", "history"]);
        assert_eq!(outcome, Outcome::Success);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["total_reflections"], 1);
        assert_eq!(json["reflections"][0]["summary"], "Tidied up.");
    }

    #[test]
    fn test_check_fails_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, out) = run_in(dir.path(), &["check"]);
        assert_eq!(outcome, Outcome::Failure);
        assert!(out.contains("1 error(s)"));
    }

    #[test]
    fn test_check_passes_clean_package() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".claude-plugin")).unwrap();
        std::fs::write(
            root.join(".claude-plugin/marketplace.json"),
            r#"{"name":"m","plugins":[{"name":"demo","source":"./plugins/demo"}]}"#,
        )
        .unwrap();
        let plugin = root.join("plugins/demo");
        std::fs::create_dir_all(plugin.join(".claude-plugin")).unwrap();
        std::fs::write(
            plugin.join(".claude-plugin/plugin.json"),
            r#"{"name":"demo","version":"1.0.0"}"#,
        )
        .unwrap();
        std::fs::create_dir_all(plugin.join("skills/demo")).unwrap();
        std::fs::write(
            plugin.join("skills/demo/SKILL.md"),
            "---\nname: demo\ndescription: Demo\n---\nDo the thing.\n",
        )
        .unwrap();

        let (outcome, out) = run_in(root, &["check"]);
        assert_eq!(outcome, Outcome::Success, "{out}");
        assert!(out.contains("0 error(s), 0 warning(s)"));
    }

    #[test]
    fn test_note_prints_written_path() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, out) = run_in(
            dir.path(),
            &["note", "Flaky CI", "--summary", "Pinned the toolchain", "--out", "notes"],
        );
        assert_eq!(outcome, Outcome::Success);
        let path = PathBuf::from(out.trim());
        assert!(path.starts_with(dir.path().join("notes")));
        assert!(path.to_string_lossy().ends_with("-flaky-ci.md"));
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("Pinned the toolchain"));
    }
}
