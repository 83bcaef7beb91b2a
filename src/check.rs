//! Package consistency checks.
//!
//! Walks marketplace -> plugins -> skills -> markdown links and reports every
//! inconsistency instead of stopping at the first one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::manifest::{Marketplace, PluginManifest};
use crate::skillpacks::{SkillIndex, SkillMetadata};

/// `[text](target)` with an optional `#anchor`
static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s#]+)(?:#[^)]*)?\)").expect("link pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageReport {
    pub root: String,
    pub plugins_checked: usize,
    pub skills_checked: usize,
    pub findings: Vec<Finding>,
}

impl PackageReport {
    fn push(&mut self, severity: Severity, location: &Path, message: impl Into<String>) {
        self.findings.push(Finding {
            severity,
            location: location.display().to_string(),
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }
}

/// Check the package rooted at `root` (the directory holding `.claude-plugin/`)
pub fn check_package(root: &Path) -> PackageReport {
    let mut report = PackageReport {
        root: root.display().to_string(),
        ..Default::default()
    };

    let marketplace_path = Marketplace::path_in(root);
    let marketplace = match Marketplace::load(root) {
        Ok(m) => m,
        Err(e) => {
            report.push(Severity::Error, &marketplace_path, format!("{:#}", e));
            return report;
        }
    };

    if marketplace.plugins.is_empty() {
        report.push(Severity::Warning, &marketplace_path, "Marketplace lists no plugins");
    }

    for entry in &marketplace.plugins {
        let plugin_dir = Marketplace::plugin_dir(root, entry);
        debug!(plugin = %entry.name, dir = %plugin_dir.display(), "Checking plugin");

        if !plugin_dir.is_dir() {
            report.push(
                Severity::Error,
                &marketplace_path,
                format!(
                    "Plugin '{}' source not found: {}",
                    entry.name,
                    plugin_dir.display()
                ),
            );
            continue;
        }
        report.plugins_checked += 1;

        let manifest_path = PluginManifest::path_in(&plugin_dir);
        let manifest = match PluginManifest::load(&plugin_dir) {
            Ok(m) => Some(m),
            Err(e) => {
                report.push(Severity::Error, &manifest_path, format!("{:#}", e));
                None
            }
        };

        if let Some(manifest) = &manifest {
            if manifest.name != entry.name {
                report.push(
                    Severity::Error,
                    &manifest_path,
                    format!(
                        "Plugin name '{}' does not match marketplace entry '{}'",
                        manifest.name, entry.name
                    ),
                );
            }
            if let Some(listed) = &entry.version {
                if listed != &manifest.version {
                    report.push(
                        Severity::Warning,
                        &manifest_path,
                        format!(
                            "Version {} differs from marketplace version {}",
                            manifest.version, listed
                        ),
                    );
                }
            }
        }

        check_skills(&mut report, &plugin_dir, manifest.as_ref());
    }

    report
}

fn check_skills(report: &mut PackageReport, plugin_dir: &Path, manifest: Option<&PluginManifest>) {
    let index = SkillIndex::build(plugin_dir);

    for (path, error) in index.errors() {
        report.push(Severity::Error, path, error.clone());
    }

    if index.count() == 0 && index.errors().is_empty() {
        report.push(
            Severity::Warning,
            &plugin_dir.join("skills"),
            "Plugin ships no skills",
        );
    }

    for skill in index.all() {
        report.skills_checked += 1;
        check_skill(report, skill, manifest);
    }
}

fn check_skill(report: &mut PackageReport, skill: &SkillMetadata, manifest: Option<&PluginManifest>) {
    if let Some(dir) = skill.dir_name() {
        if dir != skill.name {
            report.push(
                Severity::Warning,
                &skill.path,
                format!("Skill '{}' lives in directory '{}'", skill.name, dir),
            );
        }
    }

    if !skill.has_instructions {
        report.push(Severity::Warning, &skill.path, "SKILL.md has no instructions");
    }

    if let (Some(version), Some(manifest)) = (&skill.version, manifest) {
        if version != &manifest.version {
            report.push(
                Severity::Warning,
                &skill.path,
                format!(
                    "Skill version {} differs from plugin version {}",
                    version, manifest.version
                ),
            );
        }
    }

    for entry in WalkDir::new(skill.root())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
    {
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            report.push(Severity::Error, entry.path(), "Unreadable markdown file");
            continue;
        };
        for target in broken_links(entry.path(), &content) {
            report.push(
                Severity::Error,
                entry.path(),
                format!("Broken link: {}", target.display()),
            );
        }
    }
}

/// Relative link targets in `content` that do not exist next to `file`
pub fn broken_links(file: &Path, content: &str) -> Vec<PathBuf> {
    let base = file.parent().unwrap_or(Path::new("."));
    MD_LINK
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .filter(|target| !target.contains("://") && !target.starts_with("mailto:"))
        .filter(|target| !target.starts_with('/'))
        .map(PathBuf::from)
        .filter(|target| !base.join(target).exists())
        .collect()
}
