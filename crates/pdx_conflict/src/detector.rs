//! Classifies every bucket of a merged store.
//!
//! For each `(type, id)` bucket:
//!
//! - invalid definitions go to [`ConflictResult::invalid`]
//! - a bucket that one mod alone contributes is not a conflict, unless the
//!   patch mod still covers it, in which case the patch entry is an orphan
//! - a bucket the patch mod already covers is settled
//! - identical fingerprints across mods mean overwritten
//! - in non-advanced modes, a bucket where one mod depends on every other
//!   contributor is overwritten too
//! - buckets hit by ignore rules are rule-ignored
//! - everything else is a conflict

use crate::conflict_result::{ConflictResult, PatchStateMode};
use crate::ignore::IgnoreRules;
use crate::order::ModOrder;
use crate::priority::PriorityResolver;
use crate::store::{DefinitionRef, IndexedDefinitions};
use itertools::Itertools;
use pdx_script::{Definition, PriorityRuleTable};

fn is_localization(definition: &Definition) -> bool {
    let type_name = definition.type_name.to_ascii_lowercase();
    type_name.starts_with("localisation") || type_name.starts_with("localization")
}

/// Detection settings for one pass.
pub struct ConflictDetector<'a> {
    order: &'a ModOrder,
    rules: &'a PriorityRuleTable,
    mode: PatchStateMode,
    ignored_paths: String,
    ignore_rules: IgnoreRules,
    patch_mod_name: Option<&'a str>,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(order: &'a ModOrder, rules: &'a PriorityRuleTable) -> Self {
        Self {
            order,
            rules,
            mode: PatchStateMode::Default,
            ignored_paths: String::new(),
            ignore_rules: IgnoreRules::default(),
            patch_mod_name: None,
        }
    }

    pub fn with_mode(mut self, mode: PatchStateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_ignored_paths(mut self, ignored_paths: &str) -> Self {
        self.ignore_rules = IgnoreRules::parse(ignored_paths);
        self.ignored_paths = ignored_paths.to_string();
        self
    }

    pub fn with_patch_mod(mut self, patch_mod_name: &'a str) -> Self {
        self.patch_mod_name = Some(patch_mod_name);
        self
    }

    fn resolver(&self) -> PriorityResolver<'a> {
        let resolver = PriorityResolver::new(self.order, self.rules);
        match self.patch_mod_name {
            Some(name) => resolver.with_patch_mod(name),
            None => resolver,
        }
    }

    /// Some contributor depends on every other contributing mod.
    fn settled_by_dependencies(providers: &[DefinitionRef]) -> bool {
        let mods: Vec<&str> = providers.iter().map(|d| d.mod_name.as_str()).unique().collect();
        providers.iter().any(|d| {
            mods.iter()
                .filter(|m| **m != d.mod_name)
                .all(|m| d.dependencies.iter().any(|dep| dep.as_str() == *m))
        })
    }

    /// Build a [`ConflictResult`] from the merged definitions of all mods.
    pub fn build_conflict_result(&self, definitions: &IndexedDefinitions) -> ConflictResult {
        let mut result = ConflictResult::new(self.mode, self.ignored_paths.clone());
        let resolver = self.resolver();

        for (_, _, bucket) in definitions.buckets() {
            let mut candidates: Vec<DefinitionRef> = Vec::new();
            for definition in bucket {
                if definition.is_invalid() {
                    result.invalid.add(definition.clone());
                } else if definition.is_conflict_candidate()
                    && !(self.mode.without_localization() && is_localization(definition))
                {
                    candidates.push(definition.clone());
                }
            }

            let (patch, mut providers): (Vec<DefinitionRef>, Vec<DefinitionRef>) = candidates
                .into_iter()
                .partition(|d| resolver.is_patch_definition(d));
            if providers.iter().map(|d| d.mod_name.as_str()).unique().count() < 2 {
                if !patch.is_empty() {
                    tracing::debug!(
                        "Patch entry for {}-{} lost its providers",
                        patch[0].type_name,
                        patch[0].id
                    );
                    result.orphan_conflicts.add_all(patch);
                }
                continue;
            }
            providers.sort_by(|a, b| {
                (self.order.rank(&a.mod_name), a.file_name(), a.order)
                    .cmp(&(self.order.rank(&b.mod_name), b.file_name(), b.order))
            });
            result.all_conflicts.add_all(providers.iter().cloned());

            if !patch.is_empty() {
                result.resolved_conflicts.add_all(patch);
                continue;
            }

            let target = if providers.iter().map(|d| d.fingerprint).all_equal() {
                &mut result.overwritten_conflicts
            } else if !self.mode.is_advanced() && Self::settled_by_dependencies(&providers) {
                &mut result.overwritten_conflicts
            } else if self.ignore_rules.is_bucket_ignored(&providers) {
                &mut result.rule_ignored_conflicts
            } else {
                &mut result.conflicts
            };
            target.add_all(providers);
        }

        let summary = result.summary();
        tracing::info!(
            "Detected {} conflicts, {} overwritten, {} rule-ignored, {} orphaned, {} invalid",
            summary.conflicts,
            summary.overwritten,
            summary.rule_ignored,
            summary.orphans,
            summary.invalid
        );
        result
    }
}

/// Detect conflicts with default settings for the given mode and ignore rules.
pub fn build_conflict_result(
    definitions: &IndexedDefinitions,
    order: &ModOrder,
    rules: &PriorityRuleTable,
    mode: PatchStateMode,
    ignored_paths: &str,
) -> ConflictResult {
    ConflictDetector::new(order, rules)
        .with_mode(mode)
        .with_ignored_paths(ignored_paths)
        .build_conflict_result(definitions)
}
