//! Agent permission state.
//!
//! Reads the `permissions` block of agent settings files (project
//! `.claude/settings.json` and the home-level one) so session activity can be
//! compared against what is already allowed. A missing or malformed file is
//! reported as empty, never as an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

static TOOL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.+)\)$").expect("tool pattern is valid"));

/// Permission mode for tool calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    #[default]
    Default,
    AcceptEdits,
    Plan,
    BypassPermissions,
    #[serde(other)]
    Unknown,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::Plan => "plan",
            Self::BypassPermissions => "bypassPermissions",
            Self::Unknown => "unknown",
        }
    }
}

/// `permissions` block of a settings file
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsConfig {
    #[serde(default)]
    pub default_mode: Option<PermissionMode>,
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub ask: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

/// The parts of a settings file we read; everything else is ignored
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SettingsFile {
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Mcp,
    Tool,
    Unknown,
}

/// One parsed permission rule, e.g. `Bash(cargo test:*)` or `mcp__github__create_issue`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub raw: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub tool: String,
    pub pattern: String,
    pub has_wildcard: bool,
}

impl PermissionRule {
    pub fn parse(raw: &str) -> Self {
        let mut rule = Self {
            raw: raw.to_string(),
            kind: RuleKind::Unknown,
            tool: String::new(),
            pattern: String::new(),
            has_wildcard: raw.contains('*'),
        };

        if raw.starts_with("mcp__") {
            rule.kind = RuleKind::Mcp;
            let parts: Vec<&str> = raw.split("__").collect();
            if parts.len() >= 3 {
                rule.tool = format!("{}/{}", parts[1], parts[2]);
            }
            return rule;
        }

        if let Some(caps) = TOOL_PATTERN.captures(raw) {
            rule.kind = RuleKind::Tool;
            rule.tool = caps[1].to_string();
            rule.pattern = caps[2].to_string();
            return rule;
        }

        if !raw.is_empty() && raw.chars().all(|c| c.is_alphanumeric() || c == '_') {
            rule.kind = RuleKind::Tool;
            rule.tool = raw.to_string();
        }

        rule
    }

    pub fn is_bash(&self) -> bool {
        self.kind == RuleKind::Tool && self.tool == "Bash"
    }
}

/// Permission state of one settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPermissions {
    pub settings_path: String,
    pub exists: bool,
    pub default_mode: Option<PermissionMode>,
    pub current_permissions: Vec<String>,
    pub denied_patterns: Vec<String>,
    pub ask_patterns: Vec<String>,
    pub permission_patterns: Vec<PermissionRule>,
    pub by_tool: BTreeMap<String, Vec<String>>,
    pub mcp_permissions: Vec<String>,
    pub bash_patterns: Vec<String>,
}

/// Load a settings file. `None` when missing or unparsable.
pub fn load_settings(path: &Path) -> Option<SettingsFile> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Settings not readable");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Settings file is not valid JSON");
            None
        }
    }
}

pub fn read_settings(path: &Path) -> SettingsPermissions {
    let mut out = SettingsPermissions {
        settings_path: path.display().to_string(),
        exists: path.exists(),
        ..Default::default()
    };

    let Some(settings) = load_settings(path) else {
        return out;
    };
    let permissions = settings.permissions;

    for raw in &permissions.allow {
        let rule = PermissionRule::parse(raw);
        out.by_tool
            .entry(rule.tool.clone())
            .or_default()
            .push(raw.clone());
        match rule.kind {
            RuleKind::Mcp => out.mcp_permissions.push(raw.clone()),
            _ if rule.is_bash() => out.bash_patterns.push(rule.pattern.clone()),
            _ => {}
        }
        out.permission_patterns.push(rule);
    }

    out.default_mode = permissions.default_mode;
    out.current_permissions = permissions.allow;
    out.denied_patterns = permissions.deny;
    out.ask_patterns = permissions.ask;
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsReport {
    pub project_settings: SettingsPermissions,
    pub home_settings: Option<SettingsPermissions>,
    pub combined_permissions: Vec<String>,
    pub combined_bash_patterns: Vec<String>,
}

impl PermissionsReport {
    /// Sorted, unique MCP rules across both files
    pub fn combined_mcp(&self) -> Vec<String> {
        self.sources()
            .flat_map(|s| s.mcp_permissions.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn sources(&self) -> impl Iterator<Item = &SettingsPermissions> {
        std::iter::once(&self.project_settings).chain(self.home_settings.as_ref())
    }
}

/// Read project settings and, if given, home settings, and merge their allow lists
pub fn gather_permissions(project: &Path, home: Option<&Path>) -> PermissionsReport {
    let project_settings = read_settings(project);
    let home_settings = home.map(read_settings);

    let mut report = PermissionsReport {
        project_settings,
        home_settings,
        combined_permissions: Vec::new(),
        combined_bash_patterns: Vec::new(),
    };

    let permissions: BTreeSet<String> = report
        .sources()
        .flat_map(|s| s.current_permissions.iter().cloned())
        .collect();
    let bash: BTreeSet<String> = report
        .sources()
        .flat_map(|s| s.bash_patterns.iter().cloned())
        .collect();
    report.combined_permissions = permissions.into_iter().collect();
    report.combined_bash_patterns = bash.into_iter().collect();
    report
}
