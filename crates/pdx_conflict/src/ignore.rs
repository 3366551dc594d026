//! User ignore rules for conflict buckets.
//!
//! Rules are newline separated:
//!
//! ```text
//! # comment
//! modName:Some Mod       # conflicts caused only by this mod are hidden
//! common/buildings       # case-insensitive prefix on the definition file
//! gfx/*.gfx              # wildcard (`*`, `?`)
//! !common/buildings/keep # re-include
//! ```

use crate::store::DefinitionRef;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};

const MOD_NAME_PREFIX: &str = "modname:";
const INCLUDE_PREFIX: char = '!';

#[derive(Debug, Clone)]
enum Matcher {
    Prefix(String),
    Wildcard(Regex),
}

impl Matcher {
    fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.replace('\\', "/").to_lowercase();
        if !pattern.contains(['*', '?']) {
            return Some(Matcher::Prefix(pattern));
        }
        let expr = regex::escape(&pattern)
            .replace(r"\*", ".*")
            .replace(r"\?", ".");
        match RegexBuilder::new(&format!("^{expr}$"))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Some(Matcher::Wildcard(regex)),
            Err(err) => {
                tracing::warn!("Skipping invalid ignore pattern '{}': {}", pattern, err);
                None
            }
        }
    }

    fn matches(&self, file_ci: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => file_ci.starts_with(prefix.as_str()),
            Matcher::Wildcard(regex) => regex.is_match(file_ci),
        }
    }
}

/// Parsed ignore rules.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    ignored_mods: Vec<String>,
    excludes: Vec<Matcher>,
    includes: Vec<Matcher>,
}

impl IgnoreRules {
    pub fn parse(text: &str) -> Self {
        let mut rules = IgnoreRules::default();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            if line.to_lowercase().starts_with(MOD_NAME_PREFIX) {
                let name = line[MOD_NAME_PREFIX.len()..].trim();
                if !name.is_empty() {
                    rules.ignored_mods.push(name.to_string());
                }
            } else if let Some(pattern) = line.strip_prefix(INCLUDE_PREFIX) {
                rules.includes.extend(Matcher::parse(pattern.trim()));
            } else {
                rules.excludes.extend(Matcher::parse(line));
            }
        }
        rules
    }

    pub fn is_empty(&self) -> bool {
        self.ignored_mods.is_empty() && self.excludes.is_empty()
    }

    pub fn is_mod_ignored(&self, mod_name: &str) -> bool {
        self.ignored_mods.iter().any(|m| m == mod_name)
    }

    /// Case-insensitive path check; re-include rules win over ignores.
    pub fn is_path_ignored(&self, file: &str) -> bool {
        let file_ci = file.replace('\\', "/").to_lowercase();
        self.excludes.iter().any(|m| m.matches(&file_ci))
            && !self.includes.iter().any(|m| m.matches(&file_ci))
    }

    /// Whether a conflict bucket should be hidden by these rules.
    pub fn is_bucket_ignored(&self, candidates: &[DefinitionRef]) -> bool {
        if candidates.iter().any(|d| self.is_path_ignored(d.file.as_str())) {
            return true;
        }
        if self.ignored_mods.is_empty() {
            return false;
        }
        let remaining = candidates
            .iter()
            .map(|d| d.mod_name.as_str())
            .filter(|m| !self.is_mod_ignored(m))
            .unique()
            .count();
        remaining <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use pdx_script::definition::Provenance;
    use pdx_script::ValueType;
    use std::sync::Arc;

    fn def(mod_name: &str, file: &str) -> DefinitionRef {
        let provenance = Provenance {
            file: Utf8Path::new(file),
            full_path: None,
            mod_name,
            dependencies: &[],
        };
        Arc::new(provenance.definition("x", "events-txt", "x = 1", ValueType::Variable, 1))
    }

    #[test]
    fn test_prefix_and_wildcards() {
        let rules = IgnoreRules::parse("# comment\nCommon/Buildings\ngfx/*.gfx\n");
        assert!(rules.is_path_ignored("common/buildings/00.txt"));
        assert!(rules.is_path_ignored("GFX/ships.gfx"));
        assert!(!rules.is_path_ignored("gfx/ships.txt"));
        assert!(!rules.is_path_ignored("events/a.txt"));
    }

    #[test]
    fn test_include_overrides_ignore() {
        let rules = IgnoreRules::parse("common\n!common/buildings\n");
        assert!(rules.is_path_ignored("common/traits/a.txt"));
        assert!(!rules.is_path_ignored("common/buildings/a.txt"));
    }

    #[test]
    fn test_mod_name_rule() {
        let rules = IgnoreRules::parse("modName: Noisy Mod\n");
        assert!(rules.is_mod_ignored("Noisy Mod"));
        let noisy = [def("A", "events/a.txt"), def("Noisy Mod", "events/n.txt")];
        assert!(rules.is_bucket_ignored(&noisy));
        let real = [
            def("A", "events/a.txt"),
            def("B", "events/b.txt"),
            def("Noisy Mod", "events/n.txt"),
        ];
        assert!(!rules.is_bucket_ignored(&real));
    }

    #[test]
    fn test_empty_rules() {
        let rules = IgnoreRules::parse("\n  \n# only comments\n");
        assert!(rules.is_empty());
        assert!(!rules.is_bucket_ignored(&[def("A", "events/a.txt")]));
    }
}
