//! Skill packs: SKILL.md files with YAML frontmatter shipped inside a plugin.

pub mod index;
pub mod parser;

pub use index::{SkillIndex, SkillMetadata};
pub use parser::{parse_frontmatter, parse_skill, SkillDocument};
