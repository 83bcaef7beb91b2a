//! SKILL.md parsing: YAML frontmatter between `---` fences, markdown body after.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

const NAME_LIMIT: usize = 64;
const DESCRIPTION_LIMIT: usize = 1024;
const FENCE: &str = "---";

/// Frontmatter fields a skill may declare
#[derive(Debug, Clone, Deserialize)]
pub struct SkillFrontmatter {
    pub name: String,
    pub description: String,
    #[serde(default, rename = "allowed-tools")]
    pub allowed_tools: Option<ToolList>,
    #[serde(default)]
    pub metadata: SkillMetadataBlock,
}

/// `allowed-tools` accepts `Read, Grep` or a YAML sequence
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolList {
    Inline(String),
    Items(Vec<String>),
}

impl ToolList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ToolList::Inline(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            ToolList::Items(items) => items,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillMetadataBlock {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A whole SKILL.md: validated frontmatter plus the trimmed body
#[derive(Debug, Clone)]
pub struct SkillDocument {
    pub frontmatter: SkillFrontmatter,
    pub body: String,
}

/// Returns (yaml, body). The closing fence must start a line.
pub fn split_frontmatter(content: &str) -> Result<(&str, &str)> {
    let after_open = content
        .strip_prefix(FENCE)
        .ok_or_else(|| anyhow!("Expected frontmatter opening '{}' on the first line", FENCE))?;
    let close = after_open
        .find("\n---")
        .ok_or_else(|| anyhow!("Frontmatter is never closed with '{}'", FENCE))?;

    Ok((&after_open[..close], &after_open[close + 1 + FENCE.len()..]))
}

/// Parse and validate the frontmatter only
pub fn parse_frontmatter(content: &str) -> Result<SkillFrontmatter> {
    parse_skill(content).map(|doc| doc.frontmatter)
}

pub fn parse_skill(content: &str) -> Result<SkillDocument> {
    let (yaml, body) = split_frontmatter(content)?;
    let frontmatter: SkillFrontmatter =
        serde_yaml::from_str(yaml).context("Frontmatter is not valid YAML")?;

    check_name(&frontmatter.name)?;
    check_description(&frontmatter.description)?;

    Ok(SkillDocument {
        frontmatter,
        body: body.trim().to_string(),
    })
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Skill name is empty");
    }
    if name.len() > NAME_LIMIT {
        bail!("Skill name is longer than {} characters", NAME_LIMIT);
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        bail!(
            "Skill name '{}' contains '{}'; use lowercase letters, digits and hyphens",
            name,
            bad
        );
    }
    Ok(())
}

fn check_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        bail!("Skill description is empty");
    }
    if description.len() > DESCRIPTION_LIMIT {
        bail!("Skill description is longer than {} characters", DESCRIPTION_LIMIT);
    }
    Ok(())
}
