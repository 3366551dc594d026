//! Picks the winning definition of a conflict bucket.
//!
//! Rules are evaluated in a fixed sequence and the first one that applies
//! decides:
//!
//! 1. **ModOverride**: a contributing mod lists another contributor as a dependency.
//! 2. **FIOS**: the folder loads first-in-only-served; the earliest mod wins.
//! 3. **LIOS**: the folder loads last-in-only-served; the latest mod wins.
//! 4. **ModOrder**: the folder has no rule; the latest mod wins.
//! 5. **NoProvider**: only patch definitions contributed, nothing to pick.
//!
//! The result is a pure function of the candidates, the [`ModOrder`] snapshot
//! and the game's [`PriorityRuleTable`].

use crate::order::ModOrder;
use crate::store::DefinitionRef;
use pdx_script::{Definition, PriorityRule, PriorityRuleTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which rule selected the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityType {
    /// Nothing to decide: zero or one candidate.
    None,
    ModOrder,
    Fios,
    Lios,
    ModOverride,
    NoProvider,
}

impl PriorityType {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            PriorityType::None => "none",
            PriorityType::ModOrder => "mod order",
            PriorityType::Fios => "FIOS",
            PriorityType::Lios => "LIOS",
            PriorityType::ModOverride => "mod override",
            PriorityType::NoProvider => "no provider",
        }
    }
}

/// Outcome of [`PriorityResolver::eval_definition_priority`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityDefinitionResult {
    pub definition: Option<DefinitionRef>,
    /// Source file of the winner, empty when there is none.
    pub file_name: String,
    pub priority_type: PriorityType,
}

impl PriorityDefinitionResult {
    fn empty(priority_type: PriorityType) -> Self {
        Self {
            definition: None,
            file_name: String::new(),
            priority_type,
        }
    }

    fn winner(definition: &DefinitionRef, priority_type: PriorityType) -> Self {
        Self {
            file_name: definition.file.to_string(),
            definition: Some(definition.clone()),
            priority_type,
        }
    }
}

/// Applies the rule sequence against one load order snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PriorityResolver<'a> {
    order: &'a ModOrder,
    rules: &'a PriorityRuleTable,
    patch_mod_name: Option<&'a str>,
}

impl<'a> PriorityResolver<'a> {
    pub fn new(order: &'a ModOrder, rules: &'a PriorityRuleTable) -> Self {
        Self {
            order,
            rules,
            patch_mod_name: None,
        }
    }

    /// Exclude definitions contributed by this patch mod from every decision.
    pub fn with_patch_mod(mut self, patch_mod_name: &'a str) -> Self {
        self.patch_mod_name = Some(patch_mod_name);
        self
    }

    pub fn is_patch_definition(&self, definition: &Definition) -> bool {
        definition.is_custom_patch || self.patch_mod_name == Some(definition.mod_name.as_str())
    }

    // (load rank, file name, in-file order)
    fn sort_key<'d>(&self, definition: &'d Definition) -> (usize, &'d str, usize) {
        (
            self.order.rank(&definition.mod_name),
            definition.file_name(),
            definition.order,
        )
    }

    fn earliest<'d>(&self, candidates: &[&'d DefinitionRef]) -> Option<&'d DefinitionRef> {
        candidates.iter().copied().min_by(|a, b| self.sort_key(a).cmp(&self.sort_key(b)))
    }

    fn latest<'d>(&self, candidates: &[&'d DefinitionRef]) -> Option<&'d DefinitionRef> {
        candidates.iter().copied().max_by(|a, b| self.sort_key(a).cmp(&self.sort_key(b)))
    }

    /// Candidates whose mod depends on another contributing mod, narrowed to
    /// those no other overrider depends on.
    fn overriders<'d>(&self, candidates: &[&'d DefinitionRef]) -> Vec<&'d DefinitionRef> {
        let mods: BTreeSet<&str> = candidates.iter().map(|d| d.mod_name.as_str()).collect();
        let overriders: Vec<&DefinitionRef> = candidates
            .iter()
            .copied()
            .filter(|d| {
                d.dependencies
                    .iter()
                    .any(|dep| *dep != d.mod_name && mods.contains(dep.as_str()))
            })
            .collect();
        let top: Vec<&DefinitionRef> = overriders
            .iter()
            .copied()
            .filter(|d| {
                !overriders
                    .iter()
                    .any(|o| o.mod_name != d.mod_name && o.dependencies.contains(&d.mod_name))
            })
            .collect();
        if top.is_empty() {
            overriders
        } else {
            top
        }
    }

    /// Decide the winner of one bucket.
    pub fn eval_definition_priority(&self, candidates: &[DefinitionRef]) -> PriorityDefinitionResult {
        if candidates.is_empty() {
            return PriorityDefinitionResult::empty(PriorityType::None);
        }
        let providers: Vec<&DefinitionRef> = candidates
            .iter()
            .filter(|d| !self.is_patch_definition(d))
            .collect();

        match providers.as_slice() {
            [] => return PriorityDefinitionResult::empty(PriorityType::NoProvider),
            // The only provider left after filtering wins by load order.
            [only] if candidates.len() > 1 => {
                return PriorityDefinitionResult::winner(only, PriorityType::ModOrder)
            }
            [only] => return PriorityDefinitionResult::winner(only, PriorityType::None),
            _ => {}
        }

        let overriders = self.overriders(&providers);
        if let Some(winner) = self.latest(&overriders) {
            return PriorityDefinitionResult::winner(winner, PriorityType::ModOverride);
        }

        let (winner, priority_type) = match self.rules.rule_for(providers[0].file.as_str()) {
            Some(PriorityRule::Fios) => (self.earliest(&providers), PriorityType::Fios),
            Some(PriorityRule::Lios) => (self.latest(&providers), PriorityType::Lios),
            None => (self.latest(&providers), PriorityType::ModOrder),
        };
        match winner {
            Some(winner) => PriorityDefinitionResult::winner(winner, priority_type),
            None => PriorityDefinitionResult::empty(PriorityType::NoProvider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use pdx_script::definition::Provenance;
    use pdx_script::ValueType;
    use std::sync::Arc;

    fn def(mod_name: &str, file: &str, code: &str, deps: &[&str]) -> DefinitionRef {
        let dependencies: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
        let file = Utf8Path::new(file);
        let provenance = Provenance {
            file,
            full_path: None,
            mod_name,
            dependencies: &dependencies,
        };
        Arc::new(provenance.definition("X", "events-txt", code, ValueType::Object, 1))
    }

    fn rules() -> PriorityRuleTable {
        PriorityRuleTable::new()
            .with("events", PriorityRule::Lios)
            .with("interface", PriorityRule::Fios)
    }

    #[test]
    fn test_lios_picks_latest_mod() {
        let order = ModOrder::new(["A", "B"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "events/a.txt", "X = { a }", &[]);
        let b = def("B", "events/b.txt", "X = { b }", &[]);
        let result = resolver.eval_definition_priority(&[a, b.clone()]);
        assert_eq!(result.priority_type, PriorityType::Lios);
        assert_eq!(result.definition, Some(b));
        assert_eq!(result.file_name, "events/b.txt");
    }

    #[test]
    fn test_fios_picks_earliest_mod() {
        let order = ModOrder::new(["A", "B"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "interface/a.gui", "X = { a }", &[]);
        let b = def("B", "interface/b.gui", "X = { b }", &[]);
        let result = resolver.eval_definition_priority(&[b, a.clone()]);
        assert_eq!(result.priority_type, PriorityType::Fios);
        assert_eq!(result.definition, Some(a));
    }

    #[test]
    fn test_unmatched_category_uses_mod_order() {
        let order = ModOrder::new(["B", "A"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "sound/a.txt", "X = { a }", &[]);
        let b = def("B", "sound/b.txt", "X = { b }", &[]);
        let result = resolver.eval_definition_priority(&[a.clone(), b]);
        assert_eq!(result.priority_type, PriorityType::ModOrder);
        assert_eq!(result.definition, Some(a));
    }

    #[test]
    fn test_mod_override_beats_rules() {
        let order = ModOrder::new(["A", "B"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "events/a.txt", "X = { a }", &["B"]);
        let b = def("B", "events/b.txt", "X = { b }", &[]);
        let result = resolver.eval_definition_priority(&[a.clone(), b]);
        assert_eq!(result.priority_type, PriorityType::ModOverride);
        assert_eq!(result.definition, Some(a));
    }

    #[test]
    fn test_override_chain_picks_top() {
        let order = ModOrder::new(["C", "B", "A"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "events/a.txt", "X = { a }", &["B"]);
        let b = def("B", "events/b.txt", "X = { b }", &[]);
        let c = def("C", "events/c.txt", "X = { c }", &["A", "B"]);
        let result = resolver.eval_definition_priority(&[a, b, c.clone()]);
        assert_eq!(result.priority_type, PriorityType::ModOverride);
        assert_eq!(result.definition, Some(c));
    }

    #[test]
    fn test_patch_only_bucket_has_no_provider() {
        let order = ModOrder::new(["A"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules).with_patch_mod("Patch");
        let p = def("Patch", "events/zzz_a.txt", "X = { p }", &[]);
        let result = resolver.eval_definition_priority(&[p]);
        assert_eq!(result.priority_type, PriorityType::NoProvider);
        assert!(result.definition.is_none());
    }

    #[test]
    fn test_patch_definitions_are_filtered() {
        let order = ModOrder::new(["A", "Patch"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules).with_patch_mod("Patch");
        let a = def("A", "events/a.txt", "X = { a }", &[]);
        let p = def("Patch", "events/zzz_a.txt", "X = { p }", &[]);
        let result = resolver.eval_definition_priority(&[a.clone(), p]);
        assert_eq!(result.priority_type, PriorityType::ModOrder);
        assert_eq!(result.definition, Some(a));
    }

    #[test]
    fn test_lone_candidate_has_no_priority_type() {
        let order = ModOrder::new(["A"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "events/a.txt", "X = { a }", &[]);
        let result = resolver.eval_definition_priority(&[a.clone()]);
        assert_eq!(result.priority_type, PriorityType::None);
        assert_eq!(result.definition, Some(a));
    }

    #[test]
    fn test_unlisted_mods_rank_first() {
        let order = ModOrder::new(["A"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let a = def("A", "events/a.txt", "X = { a }", &[]);
        let u = def("Unlisted", "events/u.txt", "X = { u }", &[]);
        let result = resolver.eval_definition_priority(&[a.clone(), u]);
        assert_eq!(result.definition, Some(a));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let order = ModOrder::new(["A", "B"]);
        let rules = rules();
        let resolver = PriorityResolver::new(&order, &rules);
        let candidates = vec![
            def("A", "events/a.txt", "X = { a }", &[]),
            def("B", "events/b.txt", "X = { b }", &[]),
        ];
        assert_eq!(
            resolver.eval_definition_priority(&candidates),
            resolver.eval_definition_priority(&candidates)
        );
    }
}
