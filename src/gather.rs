//! Bundles gatherers for the skill's invocation modes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::history::{self, HistoryReport};
use crate::permissions::{self, PermissionsReport};
use crate::runner::CommandRunner;
use crate::session::{self, SessionOptions, SessionReport};

/// `/reflect`, `/reflect quick`, `/reflect deep`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReflectMode {
    /// Session data and current permissions
    Plain,
    /// Session data only
    Quick,
    /// Everything, including cross-session history
    Deep,
}

impl ReflectMode {
    pub fn includes_permissions(self) -> bool {
        matches!(self, Self::Plain | Self::Deep)
    }

    pub fn includes_history(self) -> bool {
        matches!(self, Self::Deep)
    }
}

/// Where each gatherer reads from
#[derive(Debug, Clone)]
pub struct GatherSources {
    pub session: SessionOptions,
    pub settings_path: PathBuf,
    pub home_settings_path: Option<PathBuf>,
    pub reflections_dir: PathBuf,
}

/// History outcome embedded in a bundle; a missing history is not fatal here
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryOutcome {
    Loaded(Box<HistoryReport>),
    Unavailable { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherBundle {
    pub mode: ReflectMode,
    pub session: SessionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryOutcome>,
}

pub fn gather(runner: &dyn CommandRunner, mode: ReflectMode, sources: &GatherSources) -> GatherBundle {
    let session = session::gather_session(runner, &sources.session);

    let permissions = mode.includes_permissions().then(|| {
        permissions::gather_permissions(
            &resolve(runner.working_dir(), &sources.settings_path),
            sources.home_settings_path.as_deref(),
        )
    });

    let history = mode.includes_history().then(|| {
        match history::load_history(&resolve(runner.working_dir(), &sources.reflections_dir)) {
            Ok(report) => HistoryOutcome::Loaded(Box::new(report)),
            Err(e) => HistoryOutcome::Unavailable {
                error: e.to_string(),
            },
        }
    });

    GatherBundle {
        mode,
        session,
        permissions,
        history,
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
