//! Tool descriptors (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a tool's implementation lives. Conflicts on name are resolved by
/// priority `Builtin > SkillLocal > Mcp` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    Builtin,
    SkillLocal,
    Mcp,
    A2aPeer,
}

impl ToolSource {
    /// Lower is higher priority when the same name appears from two sources.
    fn priority(self) -> u8 {
        match self {
            ToolSource::Builtin => 0,
            ToolSource::SkillLocal => 1,
            ToolSource::Mcp => 2,
            ToolSource::A2aPeer => 3,
        }
    }
}

/// Payment terms attached to a paid tool (spec §3, §4.2, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidSpec {
    pub price: f64,
    pub currency: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    pub source: ToolSource,
    #[serde(default)]
    pub require_confirmation: bool,
    #[serde(default)]
    pub paid: Option<PaidSpec>,
}

impl ToolDescriptor {
    pub fn builtin(name: impl Into<String>, description: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: schema,
            source: ToolSource::Builtin,
            require_confirmation: false,
            paid: None,
        }
    }
}

/// A set of tool descriptors keyed by name, enforcing the "every active
/// tool name resolves to exactly one descriptor" invariant by keeping the
/// highest-priority source on insert collisions.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    by_name: std::collections::BTreeMap<String, ToolDescriptor>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: ToolDescriptor) {
        match self.by_name.get(&descriptor.name) {
            Some(existing) if existing.source.priority() < descriptor.source.priority() => {
                // existing descriptor already wins the source-priority tie-break
            }
            _ => {
                // Equal priority re-registers (last write wins); a strictly
                // lower-priority source never displaces a higher one.
                self.by_name.insert(descriptor.name.clone(), descriptor);
            }
        }
    }

    pub fn extend(&mut self, descriptors: impl IntoIterator<Item = ToolDescriptor>) {
        for d in descriptors {
            self.insert(d);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_wins_over_mcp_on_name_collision() {
        let mut set = ToolSet::new();
        set.insert(ToolDescriptor {
            source: ToolSource::Mcp,
            ..ToolDescriptor::builtin("read_file", "mcp version", serde_json::json!({}))
        });
        set.insert(ToolDescriptor::builtin("read_file", "builtin version", serde_json::json!({})));
        assert_eq!(set.get("read_file").unwrap().source, ToolSource::Builtin);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn same_priority_reinsert_overrides_the_existing_descriptor() {
        let mut set = ToolSet::new();
        set.insert(ToolDescriptor::builtin("send_payment", "v1", serde_json::json!({})));
        set.insert(ToolDescriptor { require_confirmation: true, ..ToolDescriptor::builtin("send_payment", "v2", serde_json::json!({})) });
        let descriptor = set.get("send_payment").unwrap();
        assert!(descriptor.require_confirmation);
        assert_eq!(descriptor.description, "v2");
    }

    #[test]
    fn skill_local_wins_over_mcp() {
        let mut set = ToolSet::new();
        set.insert(ToolDescriptor {
            source: ToolSource::Mcp,
            ..ToolDescriptor::builtin("search", "mcp", serde_json::json!({}))
        });
        set.insert(ToolDescriptor {
            source: ToolSource::SkillLocal,
            ..ToolDescriptor::builtin("search", "skill", serde_json::json!({}))
        });
        assert_eq!(set.get("search").unwrap().source, ToolSource::SkillLocal);
    }
}
