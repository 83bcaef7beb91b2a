//! Marketplace and plugin manifests.
//!
//! ```text
//! .claude-plugin/marketplace.json          catalog of plugins
//! plugins/<name>/.claude-plugin/plugin.json per-plugin metadata
//! plugins/<name>/skills/<skill>/SKILL.md    skills (see skillpacks)
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_DIR: &str = ".claude-plugin";
pub const MARKETPLACE_FILE: &str = "marketplace.json";
pub const PLUGIN_FILE: &str = "plugin.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Person {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One installable plugin listed in the marketplace
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketplaceEntry {
    pub name: String,
    /// Plugin directory relative to the marketplace root
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Marketplace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Person>,
    #[serde(default)]
    pub plugins: Vec<MarketplaceEntry>,
}

impl Marketplace {
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_DIR).join(MARKETPLACE_FILE)
    }

    pub fn load(root: &Path) -> Result<Self> {
        load_json(&Self::path_in(root))
    }

    /// Resolve an entry's source directory against the marketplace root
    pub fn plugin_dir(root: &Path, entry: &MarketplaceEntry) -> PathBuf {
        root.join(entry.source.trim_start_matches("./"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Person>,
}

impl PluginManifest {
    pub fn path_in(plugin_dir: &Path) -> PathBuf {
        plugin_dir.join(MANIFEST_DIR).join(PLUGIN_FILE)
    }

    pub fn load(plugin_dir: &Path) -> Result<Self> {
        load_json(&Self::path_in(plugin_dir))
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
