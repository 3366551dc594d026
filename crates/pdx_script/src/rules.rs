//! Per-game override rules: which mod wins a conflict in a given folder.

use serde::{Deserialize, Serialize};

/// Override direction for a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityRule {
    /// First in, only served: the earliest-loaded definition wins.
    Fios,
    /// Last in, only served: the latest-loaded definition wins.
    Lios,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CategoryRule {
    prefix: String,
    rule: PriorityRule,
}

/// Folder-prefix rule table. The longest matching prefix decides.
///
/// Folders with no entry fall back to plain mod load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRuleTable {
    entries: Vec<CategoryRule>,
}

impl PriorityRuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: &str, rule: PriorityRule) -> Self {
        self.insert(prefix, rule);
        self
    }

    pub fn insert(&mut self, prefix: &str, rule: PriorityRule) {
        let prefix = prefix.trim_matches('/').replace('\\', "/").to_lowercase();
        self.entries.retain(|e| e.prefix != prefix);
        self.entries.push(CategoryRule { prefix, rule });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rule for a mod-relative path or category, matched on whole path segments.
    pub fn rule_for(&self, path: &str) -> Option<PriorityRule> {
        let path = path.replace('\\', "/").to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                path == e.prefix
                    || (path.starts_with(&e.prefix) && path[e.prefix.len()..].starts_with('/'))
            })
            .max_by_key(|e| e.prefix.len())
            .map(|e| e.rule)
    }

    pub fn is_fios(&self, path: &str) -> bool {
        self.rule_for(path) == Some(PriorityRule::Fios)
    }
}
