//! The classified output of one detection pass.

use crate::store::{DefinitionRef, IndexedDefinitions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How aggressively conflicts are surfaced and whether commits are allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchStateMode {
    /// Detection only.
    None,
    #[default]
    Default,
    Advanced,
    ReadOnly,
    DefaultWithoutLocalization,
    AdvancedWithoutLocalization,
    ReadOnlyWithoutLocalization,
}

impl PatchStateMode {
    pub fn without_localization(self) -> bool {
        matches!(
            self,
            PatchStateMode::DefaultWithoutLocalization
                | PatchStateMode::AdvancedWithoutLocalization
                | PatchStateMode::ReadOnlyWithoutLocalization
        )
    }

    /// Advanced modes also surface buckets settled by mod dependencies.
    pub fn is_advanced(self) -> bool {
        matches!(
            self,
            PatchStateMode::Advanced | PatchStateMode::AdvancedWithoutLocalization
        )
    }

    pub fn allows_commits(self) -> bool {
        !matches!(
            self,
            PatchStateMode::None
                | PatchStateMode::ReadOnly
                | PatchStateMode::ReadOnlyWithoutLocalization
        )
    }
}

impl fmt::Display for PatchStateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatchStateMode::None => "none",
            PatchStateMode::Default => "default",
            PatchStateMode::Advanced => "advanced",
            PatchStateMode::ReadOnly => "readOnly",
            PatchStateMode::DefaultWithoutLocalization => "defaultWithoutLocalization",
            PatchStateMode::AdvancedWithoutLocalization => "advancedWithoutLocalization",
            PatchStateMode::ReadOnlyWithoutLocalization => "readOnlyWithoutLocalization",
        };
        f.write_str(name)
    }
}

/// All named definition sets produced by detection and updated by commits.
///
/// `all_conflicts` holds every definition of every multi-mod bucket. The other
/// sets partition those buckets by state, plus the patch definitions written
/// for resolved, ignored and custom entries.
#[derive(Debug, Default)]
pub struct ConflictResult {
    pub all_conflicts: IndexedDefinitions,
    pub conflicts: IndexedDefinitions,
    pub custom_conflicts: IndexedDefinitions,
    pub ignored_conflicts: IndexedDefinitions,
    pub orphan_conflicts: IndexedDefinitions,
    pub overwritten_conflicts: IndexedDefinitions,
    pub resolved_conflicts: IndexedDefinitions,
    pub rule_ignored_conflicts: IndexedDefinitions,
    /// Files that failed to parse.
    pub invalid: IndexedDefinitions,
    pub mode: PatchStateMode,
    pub ignored_paths: String,
    disposed: bool,
}

/// One bucket's definitions in every state set, in [`ConflictResult`] field order.
#[derive(Debug, Clone)]
pub(crate) struct BucketSnapshot {
    type_name: String,
    id: String,
    sets: [Vec<DefinitionRef>; 7],
}

impl BucketSnapshot {
    pub(crate) fn key(&self) -> String {
        format!("{}-{}", self.type_name, self.id)
    }

    /// Every patch definition the bucket had before the change.
    pub(crate) fn patch_definitions(&self) -> impl Iterator<Item = &DefinitionRef> {
        self.sets[3..].iter().flatten()
    }
}

/// Bucket counts per set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSummary {
    pub conflicts: usize,
    pub overwritten: usize,
    pub resolved: usize,
    pub ignored: usize,
    pub rule_ignored: usize,
    pub custom: usize,
    pub orphans: usize,
    pub invalid: usize,
}

impl ConflictResult {
    pub fn new(mode: PatchStateMode, ignored_paths: impl Into<String>) -> Self {
        Self {
            mode,
            ignored_paths: ignored_paths.into(),
            ..Default::default()
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn summary(&self) -> ConflictSummary {
        ConflictSummary {
            conflicts: self.conflicts.bucket_count(),
            overwritten: self.overwritten_conflicts.bucket_count(),
            resolved: self.resolved_conflicts.bucket_count(),
            ignored: self.ignored_conflicts.bucket_count(),
            rule_ignored: self.rule_ignored_conflicts.bucket_count(),
            custom: self.custom_conflicts.bucket_count(),
            orphans: self.orphan_conflicts.bucket_count(),
            invalid: self.invalid.len(),
        }
    }

    /// Remove a bucket from every state set except `all_conflicts`.
    pub(crate) fn detach_bucket(&mut self, type_name: &str, id: &str) {
        for store in [
            &mut self.conflicts,
            &mut self.overwritten_conflicts,
            &mut self.rule_ignored_conflicts,
            &mut self.resolved_conflicts,
            &mut self.ignored_conflicts,
            &mut self.orphan_conflicts,
        ] {
            store.remove_bucket(type_name, id);
        }
    }

    fn bucket_sets_mut(&mut self) -> [&mut IndexedDefinitions; 7] {
        [
            &mut self.conflicts,
            &mut self.overwritten_conflicts,
            &mut self.rule_ignored_conflicts,
            &mut self.resolved_conflicts,
            &mut self.ignored_conflicts,
            &mut self.orphan_conflicts,
            &mut self.custom_conflicts,
        ]
    }

    /// Copy of one bucket across every state set, for rollback.
    pub(crate) fn snapshot_bucket(&mut self, type_name: &str, id: &str) -> BucketSnapshot {
        let sets = self
            .bucket_sets_mut()
            .map(|store| store.get_by_type_and_id(type_name, id).to_vec());
        BucketSnapshot {
            type_name: type_name.to_string(),
            id: id.to_string(),
            sets,
        }
    }

    pub(crate) fn restore_bucket(&mut self, snapshot: BucketSnapshot) {
        let BucketSnapshot { type_name, id, sets } = snapshot;
        for (store, definitions) in self.bucket_sets_mut().into_iter().zip(sets) {
            store.remove_bucket(&type_name, &id);
            store.add_all(definitions);
        }
    }

    /// Release every definition. The result is unusable afterwards.
    pub fn dispose(&mut self) {
        for store in [
            &mut self.all_conflicts,
            &mut self.conflicts,
            &mut self.custom_conflicts,
            &mut self.ignored_conflicts,
            &mut self.orphan_conflicts,
            &mut self.overwritten_conflicts,
            &mut self.resolved_conflicts,
            &mut self.rule_ignored_conflicts,
            &mut self.invalid,
        ] {
            store.clear();
        }
        self.ignored_paths.clear();
        self.disposed = true;
    }
}
