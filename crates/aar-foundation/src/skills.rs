//! Skill Registry: loads declarative skill bundles from a directory tree
//! (spec §2, §3, §6).

use aar_kernel::error::{AarError, AarResult};
use aar_kernel::skill::{SkillBundle, SkillFrontMatter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Loads and holds all skill bundles discovered under `root_dir`. Each
/// immediate subdirectory with a `SKILL.md` file is one bundle; the file
/// begins with a YAML front-matter block followed by a markdown body that
/// becomes its instructions (spec §6).
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    root_dir: Option<PathBuf>,
    bundles: BTreeMap<String, SkillBundle>,
}

impl SkillRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(root_dir: impl AsRef<Path>) -> AarResult<Self> {
        let root_dir = root_dir.as_ref();
        if !root_dir.exists() {
            return Err(AarError::ConfigError(format!("skills directory does not exist: {}", root_dir.display())));
        }

        let mut bundles = BTreeMap::new();
        for entry in std::fs::read_dir(root_dir).map_err(|e| AarError::ConfigError(format!("failed to read skills directory: {e}")))? {
            let entry = entry.map_err(|e| AarError::ConfigError(format!("failed to read skills directory entry: {e}")))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let skill_md = path.join("SKILL.md");
            if !skill_md.exists() {
                continue;
            }
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let bundle = Self::load_one(&skill_md, &dir_name)?;
            let has_local = path.join("tools.rs").exists() || path.join("tools.py").exists();
            bundles.insert(bundle.name.clone(), SkillBundle { has_local_impls: has_local, ..bundle });
        }

        Ok(Self { root_dir: Some(root_dir.to_path_buf()), bundles })
    }

    fn load_one(skill_md: &Path, dir_name: &str) -> AarResult<SkillBundle> {
        let content = std::fs::read_to_string(skill_md).map_err(|e| AarError::ConfigError(format!("failed to read {}: {e}", skill_md.display())))?;
        let (front_matter, body) = split_front_matter(&content).ok_or_else(|| AarError::ConfigError(format!("{} is missing a YAML front-matter block", skill_md.display())))?;
        let front: SkillFrontMatter = serde_yaml::from_str(front_matter).map_err(|e| AarError::ConfigError(format!("invalid front matter in {}: {e}", skill_md.display())))?;
        Ok(SkillBundle::from_front_matter(front, body.trim().to_string(), dir_name, false))
    }

    pub fn rescan(&mut self) -> AarResult<()> {
        if let Some(dir) = self.root_dir.clone() {
            *self = Self::load(dir)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SkillBundle> {
        self.bundles.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillBundle> {
        self.bundles.values()
    }

    pub fn insert(&mut self, bundle: SkillBundle) {
        self.bundles.insert(bundle.name.clone(), bundle);
    }
}

/// Splits a `SKILL.md` file into its YAML front matter and markdown body.
/// Front matter is delimited by `---` lines at the top of the file.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix("---\n").or_else(|| content.strip_prefix("---\r\n"))?;
    let end = content.find("\n---").or_else(|| content.find("\r\n---"))?;
    let front_matter = &content[..end];
    let after = &content[end..];
    let body = after.trim_start_matches("\r\n---").trim_start_matches("\n---");
    Some((front_matter, body))
}
