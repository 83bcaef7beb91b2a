use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runner::DEFAULT_TIMEOUT_MS;

pub const DEFAULT_COMMITS: usize = 20;
pub const DEFAULT_DIFF_WINDOW: usize = 5;
pub const DEFAULT_TRACKER_COMMAND: &str = "bd";
pub const DEFAULT_TRACKER_DIR: &str = ".beads";
pub const DEFAULT_TRACKER_LIMIT: usize = 10;
pub const DEFAULT_REFLECTIONS_DIR: &str = "history/reflections";
pub const DEFAULT_SETTINGS_PATH: &str = ".claude/settings.json";

/// Configuration for the session gatherer
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub commits: Option<usize>,
    #[serde(default)]
    pub diff_window: Option<usize>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SessionConfig {
    pub fn commits(&self) -> usize {
        self.commits.unwrap_or(DEFAULT_COMMITS)
    }

    pub fn diff_window(&self) -> usize {
        self.diff_window.unwrap_or(DEFAULT_DIFF_WINDOW)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// Configuration for the issue tracker queries
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TrackerConfig {
    /// Tracker command line, e.g. `bd` or `bd --no-daemon`
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub closed_limit: Option<usize>,
    #[serde(default)]
    pub open_limit: Option<usize>,
}

impl TrackerConfig {
    /// Split the configured command line into program and leading arguments
    pub fn command_line(&self) -> Result<(String, Vec<String>)> {
        let raw = self.command.as_deref().unwrap_or(DEFAULT_TRACKER_COMMAND);
        let mut words = shell_words::split(raw)
            .with_context(|| format!("Invalid tracker command: {}", raw))?;
        if words.is_empty() {
            anyhow::bail!("Tracker command is empty");
        }
        let program = words.remove(0);
        Ok((program, words))
    }

    pub fn data_dir(&self) -> &str {
        self.data_dir.as_deref().unwrap_or(DEFAULT_TRACKER_DIR)
    }

    pub fn closed_limit(&self) -> usize {
        self.closed_limit.unwrap_or(DEFAULT_TRACKER_LIMIT)
    }

    pub fn open_limit(&self) -> usize {
        self.open_limit.unwrap_or(DEFAULT_TRACKER_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HistoryConfig {
    #[serde(default)]
    pub reflections_dir: Option<String>,
}

impl HistoryConfig {
    pub fn reflections_dir(&self) -> PathBuf {
        PathBuf::from(
            self.reflections_dir
                .as_deref()
                .unwrap_or(DEFAULT_REFLECTIONS_DIR),
        )
    }
}

/// Where to look for agent settings files
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PermissionsSource {
    #[serde(default)]
    pub settings_path: Option<String>,
    #[serde(default)]
    pub include_home: Option<bool>,
}

impl PermissionsSource {
    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(
            self.settings_path
                .as_deref()
                .unwrap_or(DEFAULT_SETTINGS_PATH),
        )
    }

    /// Home-level settings file, if home lookup is enabled and resolvable
    pub fn home_settings_path(&self) -> Option<PathBuf> {
        if !self.include_home.unwrap_or(true) {
            return None;
        }
        dirs::home_dir().map(|home| home.join(".claude").join("settings.json"))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub permissions: PermissionsSource,
}

impl Config {
    /// Load configuration for a project rooted at `dir`
    /// Priority: local (<dir>/.reflect/config.local.toml) > project (<dir>/.reflect/config.toml) > user (~/.reflect/config.toml)
    pub fn load_in(dir: &Path) -> Result<Self> {
        let user_config = dirs::home_dir().map(|home| home.join(".reflect").join("config.toml"));
        Self::load_layered(user_config.as_deref(), dir)
    }

    fn load_layered(user_config: Option<&Path>, dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config) = user_config.filter(|p| p.exists()) {
            config.merge(Self::load_from(user_config)?);
        }

        let project_config = dir.join(".reflect").join("config.toml");
        if project_config.exists() {
            config.merge(Self::load_from(&project_config)?);
        }

        // Should be gitignored
        let local_config = dir.join(".reflect").join("config.local.toml");
        if local_config.exists() {
            config.merge(Self::load_from(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority when set)
    pub fn merge(&mut self, other: Config) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.session.commits, other.session.commits);
        set(&mut self.session.diff_window, other.session.diff_window);
        set(&mut self.session.timeout_ms, other.session.timeout_ms);

        set(&mut self.tracker.command, other.tracker.command);
        set(&mut self.tracker.data_dir, other.tracker.data_dir);
        set(&mut self.tracker.closed_limit, other.tracker.closed_limit);
        set(&mut self.tracker.open_limit, other.tracker.open_limit);

        set(
            &mut self.history.reflections_dir,
            other.history.reflections_dir,
        );

        set(
            &mut self.permissions.settings_path,
            other.permissions.settings_path,
        );
        set(
            &mut self.permissions.include_home,
            other.permissions.include_home,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.commits(), 20);
        assert_eq!(config.session.diff_window(), 5);
        assert_eq!(config.session.timeout(), Duration::from_secs(30));
        assert_eq!(config.tracker.data_dir(), ".beads");
        assert_eq!(
            config.history.reflections_dir(),
            PathBuf::from("history/reflections")
        );
        assert_eq!(
            config.permissions.settings_path(),
            PathBuf::from(".claude/settings.json")
        );
    }

    #[test]
    fn test_merge_overrides_only_set_values() {
        let mut base: Config = toml::from_str(
            r#"
[session]
commits = 50
timeout_ms = 1000

[tracker]
command = "bd"
"#,
        )
        .unwrap();
        let over: Config = toml::from_str(
            r#"
[session]
commits = 10

[history]
reflections_dir = "notes"
"#,
        )
        .unwrap();

        base.merge(over);
        assert_eq!(base.session.commits(), 10);
        assert_eq!(base.session.timeout_ms, Some(1000));
        assert_eq!(base.tracker.command.as_deref(), Some("bd"));
        assert_eq!(base.history.reflections_dir(), PathBuf::from("notes"));
    }

    #[test]
    fn test_tracker_command_line() {
        let tracker = TrackerConfig {
            command: Some("bd --db '.beads/my db.sqlite'".to_string()),
            ..Default::default()
        };
        let (program, args) = tracker.command_line().unwrap();
        assert_eq!(program, "bd");
        assert_eq!(args, vec!["--db", ".beads/my db.sqlite"]);

        let empty = TrackerConfig {
            command: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(empty.command_line().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[permissions]\ninclude_home = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.permissions.home_settings_path().is_none());

        std::fs::write(&path, "[session\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_layers_resolve_against_project_dir() {
        let home = tempfile::tempdir().unwrap();
        let user = home.path().join("config.toml");
        std::fs::write(&user, "[session]\ncommits = 7\ndiff_window = 2\n").unwrap();

        let project = tempfile::tempdir().unwrap();
        let dot = project.path().join(".reflect");
        std::fs::create_dir_all(&dot).unwrap();
        std::fs::write(
            dot.join("config.toml"),
            "[session]\ncommits = 40\n\n[history]\nreflections_dir = \"notes\"\n",
        )
        .unwrap();
        std::fs::write(dot.join("config.local.toml"), "[session]\ncommits = 3\n").unwrap();

        let config = Config::load_layered(Some(&user), project.path()).unwrap();
        assert_eq!(config.session.commits(), 3);
        assert_eq!(config.session.diff_window(), 2);
        assert_eq!(config.history.reflections_dir(), PathBuf::from("notes"));

        // Nothing under an unrelated directory
        let elsewhere = tempfile::tempdir().unwrap();
        let config = Config::load_layered(None, elsewhere.path()).unwrap();
        assert_eq!(
            config.history.reflections_dir(),
            PathBuf::from("history/reflections")
        );
    }
}
