//! Skill bundle type (spec §3, §6 "Skill bundle format").

use serde::{Deserialize, Serialize};

/// YAML front-matter of a `SKILL.md` file (spec §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkillFrontMatter {
    #[serde(default)]
    pub name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// A declarative package binding a name, description, tool dependencies,
/// and instruction text (spec §3, glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillBundle {
    pub name: String,
    pub description: String,
    pub tool_names: Vec<String>,
    pub instructions_markdown: String,
    /// Path to a local implementation module, if the bundle carries one
    /// (spec §4.2 skill-local dispatch; §6 "tools.py-equivalent").
    #[serde(default)]
    pub has_local_impls: bool,
}

impl SkillBundle {
    pub fn from_front_matter(front: SkillFrontMatter, instructions_markdown: String, dir_name: &str, has_local_impls: bool) -> Self {
        Self {
            name: front.name.unwrap_or_else(|| dir_name.to_string()),
            description: front.description,
            tool_names: front.tools,
            instructions_markdown,
            has_local_impls,
        }
    }
}
