//! Session data gathering.
//!
//! Collects what happened during a working session (git activity, issue
//! tracker status, files touched) for the agent to analyze. Nothing here
//! fails: missing tools degrade to `available: false`.

pub mod git;
pub mod tracker;

pub use git::{CommitSummary, DiffStats, GitActivity, StatusEntry};
pub use tracker::{TrackerActivity, TrackerIssue};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::{SessionConfig, TrackerConfig};
use crate::runner::CommandRunner;

/// Options for one session gather
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub commits: usize,
    pub diff_window: usize,
    pub tracker: TrackerConfig,
}

impl SessionOptions {
    pub fn from_config(session: &SessionConfig, tracker: &TrackerConfig) -> Self {
        Self {
            commits: session.commits(),
            diff_window: session.diff_window(),
            tracker: tracker.clone(),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default(), &TrackerConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub timestamp: DateTime<Local>,
    pub git: GitActivity,
    pub tracker: TrackerActivity,
    pub files_edited: Vec<String>,
}

pub fn gather_session(runner: &dyn CommandRunner, options: &SessionOptions) -> SessionReport {
    let git = git::gather_git(runner, options.commits, options.diff_window);
    let tracker = tracker::gather_tracker(runner, &options.tracker);
    let files_edited = git
        .status
        .iter()
        .map(|entry| entry.current_path().to_string())
        .collect();

    SessionReport {
        timestamp: Local::now(),
        git,
        tracker,
        files_edited,
    }
}
