//! Skill discovery inside a plugin directory.

use super::parser::parse_skill;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Minimal metadata for a skill
#[derive(Debug, Clone)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    pub allowed_tools: Option<Vec<String>>,
    pub version: Option<String>,
    pub tags: Vec<String>,
    /// Whether anything follows the frontmatter
    pub has_instructions: bool,
    /// Path to SKILL.md
    pub path: PathBuf,
}

impl SkillMetadata {
    /// Name of the directory holding SKILL.md
    pub fn dir_name(&self) -> Option<String> {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

/// Index of all skills found under a `skills/` directory
#[derive(Debug, Default)]
pub struct SkillIndex {
    skills: BTreeMap<String, SkillMetadata>,
    parse_errors: Vec<(PathBuf, String)>,
}

impl SkillIndex {
    /// Index `<plugin_root>/skills/*/SKILL.md`
    pub fn build(plugin_root: &Path) -> Self {
        let mut index = SkillIndex::default();
        index.scan_dir(&plugin_root.join("skills"));
        index
    }

    fn scan_dir(&mut self, dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if !path.is_dir() {
                continue;
            }

            let skill_md = path.join("SKILL.md");
            if !skill_md.exists() {
                continue;
            }

            match Self::index_skill(&skill_md) {
                Ok(meta) => match self.skills.get(&meta.name) {
                    Some(first) => {
                        let message = format!(
                            "Duplicate skill name '{}' (already declared in {})",
                            meta.name,
                            first.path.display()
                        );
                        self.parse_errors.push((skill_md, message));
                    }
                    None => {
                        self.skills.insert(meta.name.clone(), meta);
                    }
                },
                Err(e) => {
                    self.parse_errors.push((skill_md, format!("{:#}", e)));
                }
            }
        }
    }

    fn index_skill(path: &Path) -> Result<SkillMetadata> {
        let content = std::fs::read_to_string(path)?;
        let doc = parse_skill(&content)?;
        let fm = doc.frontmatter;

        Ok(SkillMetadata {
            name: fm.name,
            description: fm.description,
            allowed_tools: fm.allowed_tools.map(|tools| tools.into_vec()),
            version: fm.metadata.version,
            tags: fm.metadata.tags,
            has_instructions: !doc.body.is_empty(),
            path: path.to_path_buf(),
        })
    }

    /// All skill metadata, ordered by name
    pub fn all(&self) -> impl Iterator<Item = &SkillMetadata> {
        self.skills.values()
    }

    pub fn get(&self, name: &str) -> Option<&SkillMetadata> {
        self.skills.get(name)
    }

    pub fn errors(&self) -> &[(PathBuf, String)] {
        &self.parse_errors
    }

    pub fn count(&self) -> usize {
        self.skills.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, dir: &str, content: &str) {
        let skill_dir = root.join("skills").join(dir);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("SKILL.md"), content).unwrap();
    }

    #[test]
    fn test_build_indexes_valid_and_records_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(
            dir.path(),
            "reflect",
            "---\nname: reflect\ndescription: Reflect on a session\nmetadata:\n  version: \"1.0.0\"\n---\nBody\n",
        );
        write_skill(dir.path(), "broken", "no frontmatter here");
        std::fs::create_dir_all(dir.path().join("skills").join("empty")).unwrap();

        let index = SkillIndex::build(dir.path());
        assert_eq!(index.count(), 1);
        let skill = index.get("reflect").unwrap();
        assert_eq!(skill.version.as_deref(), Some("1.0.0"));
        assert_eq!(skill.dir_name().as_deref(), Some("reflect"));
        assert!(skill.has_instructions);
        assert_eq!(index.errors().len(), 1);
        assert!(index.errors()[0].0.ends_with("broken/SKILL.md"));
    }

    #[test]
    fn test_missing_skills_dir() {
        let dir = tempfile::tempdir().unwrap();
        let index = SkillIndex::build(dir.path());
        assert_eq!(index.count(), 0);
        assert!(index.errors().is_empty());
    }

    #[test]
    fn test_duplicate_names_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let skill = "---\nname: reflect\ndescription: Reflect\n---\nBody\n";
        write_skill(dir.path(), "reflect", skill);
        write_skill(dir.path(), "reflect-copy", skill);

        let index = SkillIndex::build(dir.path());
        assert_eq!(index.count(), 1);
        assert!(index.get("reflect").unwrap().path.ends_with("reflect/SKILL.md"));
        assert_eq!(index.errors().len(), 1);
        assert!(index.errors()[0].0.ends_with("reflect-copy/SKILL.md"));
        assert!(index.errors()[0].1.contains("Duplicate skill name 'reflect'"));
    }
}
