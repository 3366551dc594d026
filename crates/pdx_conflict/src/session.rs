//! Conflict-solving session.
//!
//! A [`ConflictSession`] owns one [`ConflictResult`] together with the mod
//! order snapshot it was detected against and the [`PatchWriter`] for the
//! collection. Commits (apply, ignore, custom, reset) are exclusive: a second
//! call while one is running fails with [`Error::ResolutionInProgress`]
//! instead of waiting.
//!
//! Each commit touches exactly one bucket. If writing its output files or the
//! patch state fails, that bucket is rolled back in memory and on disk and the
//! error is returned; buckets committed earlier stay committed.

use crate::conflict_result::{BucketSnapshot, ConflictResult, ConflictSummary, PatchStateMode};
use crate::detector::ConflictDetector;
use crate::error::{Error, Result};
use crate::order::ModOrder;
use crate::priority::{PriorityDefinitionResult, PriorityResolver};
use crate::state::{PatchState, PatchStateEntry};
use crate::store::{DefinitionRef, IndexedDefinitions};
use crate::writer::PatchWriter;
use pdx_script::{Definition, GameType};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Held while a commit runs. Releases the session on drop.
struct ResolutionGuard<'a>(&'a AtomicBool);

impl<'a> ResolutionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::ResolutionInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitTarget {
    Resolved,
    Ignored,
    Custom,
}

/// Which list of the persisted state an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavedDecision {
    Resolved,
    Ignored,
    Orphaned,
}

/// Every output file the patch definitions of `result` map to.
fn patch_outputs(result: &ConflictResult) -> BTreeSet<String> {
    patch_sets(result)
        .into_iter()
        .flat_map(|store| store.iter())
        .flat_map(|d| d.generated_file_names.iter().cloned())
        .collect()
}

fn patch_sets(result: &ConflictResult) -> [&IndexedDefinitions; 4] {
    [
        &result.resolved_conflicts,
        &result.ignored_conflicts,
        &result.custom_conflicts,
        &result.orphan_conflicts,
    ]
}

/// One conflict-solving session for a game, a mod order and a collection.
pub struct ConflictSession {
    game: GameType,
    order: ModOrder,
    writer: PatchWriter,
    result: Mutex<ConflictResult>,
    busy: AtomicBool,
}

impl ConflictSession {
    pub fn new(game: GameType, order: ModOrder, result: ConflictResult, writer: PatchWriter) -> Self {
        Self {
            game,
            order,
            writer,
            result: Mutex::new(result),
            busy: AtomicBool::new(false),
        }
    }

    /// Run detection over `definitions` and open a session on the result.
    ///
    /// Definitions contributed by the patch mod itself count as resolutions.
    pub fn detect(
        game: GameType,
        order: ModOrder,
        definitions: &IndexedDefinitions,
        mode: PatchStateMode,
        ignored_paths: &str,
        writer: PatchWriter,
    ) -> Self {
        let result = ConflictDetector::new(&order, &game.rules)
            .with_mode(mode)
            .with_ignored_paths(ignored_paths)
            .with_patch_mod(writer.patch_name())
            .build_conflict_result(definitions);
        Self::new(game, order, result, writer)
    }

    pub fn game(&self) -> &GameType {
        &self.game
    }

    pub fn order(&self) -> &ModOrder {
        &self.order
    }

    pub fn writer(&self) -> &PatchWriter {
        &self.writer
    }

    fn lock(&self) -> Result<MutexGuard<'_, ConflictResult>> {
        let guard = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_disposed() {
            return Err(Error::SessionDisposed);
        }
        Ok(guard)
    }

    fn lock_for_commit(&self) -> Result<MutexGuard<'_, ConflictResult>> {
        let guard = self.lock()?;
        if !guard.mode.allows_commits() {
            return Err(Error::ReadOnlyPatch(guard.mode.to_string()));
        }
        Ok(guard)
    }

    /// Read access to the current result.
    pub fn with_result<R>(&self, f: impl FnOnce(&ConflictResult) -> R) -> Result<R> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    pub fn summary(&self) -> Result<ConflictSummary> {
        self.with_result(ConflictResult::summary)
    }

    /// `(type, id)` of every open conflict bucket.
    pub fn conflict_keys(&self) -> Result<Vec<(String, String)>> {
        self.with_result(|result| {
            result
                .conflicts
                .buckets()
                .map(|(type_name, id, _)| (type_name.to_string(), id.to_string()))
                .collect()
        })
    }

    /// Every provider of a bucket, in priority sort order.
    pub fn candidates(&self, type_name: &str, id: &str) -> Result<Vec<DefinitionRef>> {
        self.with_result(|result| result.all_conflicts.get_by_type_and_id(type_name, id).to_vec())
    }

    pub fn resolver(&self) -> PriorityResolver<'_> {
        PriorityResolver::new(&self.order, &self.game.rules).with_patch_mod(self.writer.patch_name())
    }

    pub fn eval_definition_priority(&self, candidates: &[DefinitionRef]) -> PriorityDefinitionResult {
        self.resolver().eval_definition_priority(candidates)
    }

    /// Commit `definition` as the resolution of its bucket.
    ///
    /// Returns `Ok(false)` if the bucket is not a known conflict.
    pub fn apply_mod_patch(&self, definition: &Definition) -> Result<bool> {
        self.commit(definition, CommitTarget::Resolved)
    }

    /// Accept the bucket as-is by committing its first candidate's code.
    ///
    /// Returns `Ok(false)` if the bucket is not a known conflict.
    pub fn ignore_mod_patch(&self, definition: &Definition) -> Result<bool> {
        self.commit(definition, CommitTarget::Ignored)
    }

    /// Commit a user-authored definition. It does not need to match a conflict.
    pub fn add_custom_patch(&self, definition: &Definition) -> Result<bool> {
        self.commit(definition, CommitTarget::Custom)
    }

    fn commit(&self, definition: &Definition, target: CommitTarget) -> Result<bool> {
        let _guard = ResolutionGuard::acquire(&self.busy)?;
        let mut result = self.lock_for_commit()?;
        let (type_name, id) = (definition.type_name.as_str(), definition.id.as_str());

        let source = match target {
            CommitTarget::Resolved => {
                if !result.all_conflicts.contains(type_name, id) {
                    return Ok(false);
                }
                definition.clone()
            }
            CommitTarget::Ignored => {
                let first = result
                    .conflicts
                    .get_by_type_and_id(type_name, id)
                    .first()
                    .or_else(|| result.all_conflicts.get_by_type_and_id(type_name, id).first())
                    .cloned();
                match first {
                    Some(first) => (*first).clone(),
                    None => return Ok(false),
                }
            }
            CommitTarget::Custom => {
                let mut custom = definition.clone();
                custom.is_custom_patch = true;
                custom
            }
        };

        let patch = Arc::new(self.writer.patch_definition(&source));
        let snapshot = result.snapshot_bucket(type_name, id);
        result.detach_bucket(type_name, id);
        result.custom_conflicts.remove_bucket(type_name, id);
        match target {
            CommitTarget::Resolved => result.resolved_conflicts.add(patch.clone()),
            CommitTarget::Ignored => result.ignored_conflicts.add(patch.clone()),
            CommitTarget::Custom => result.custom_conflicts.add(patch.clone()),
        }

        let outputs = Self::affected_outputs(&snapshot, &patch);
        self.persist_bucket(&mut result, snapshot, &outputs)?;
        tracing::info!(
            "Committed {:?} patch for {} from '{}'",
            target,
            patch.type_and_id(),
            source.mod_name
        );
        Ok(true)
    }

    fn affected_outputs(snapshot: &BucketSnapshot, patch: &Definition) -> BTreeSet<String> {
        snapshot
            .patch_definitions()
            .flat_map(|d| d.generated_file_names.iter().cloned())
            .chain(patch.generated_file_names.iter().cloned())
            .collect()
    }

    /// Write the outputs touched by one bucket change and save the state.
    /// If any of those writes fails the bucket is restored from `snapshot`
    /// and `state.json` keeps its previous contents.
    fn persist_bucket(
        &self,
        result: &mut ConflictResult,
        snapshot: BucketSnapshot,
        outputs: &BTreeSet<String>,
    ) -> Result<()> {
        let key = snapshot.key();
        let as_patch_write = |e: Error| match e {
            Error::Io(source) => Error::PatchWrite {
                key: key.clone(),
                source,
            },
            other => other,
        };
        let written = self
            .writer
            .write_descriptor(self.order.mods())
            .map_err(&as_patch_write)
            .and_then(|()| {
                self.write_outputs(result, outputs)
                    .map_err(|source| Error::PatchWrite {
                        key: key.clone(),
                        source,
                    })
            })
            .and_then(|()| self.save_state(result).map_err(&as_patch_write));

        if let Err(e) = written {
            tracing::warn!("Rolling back {}: {}", key, e);
            result.restore_bucket(snapshot);
            if let Err(restore) = self.write_outputs(result, outputs) {
                tracing::error!("Failed to restore patch files for {}: {}", key, restore);
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_outputs(&self, result: &ConflictResult, outputs: &BTreeSet<String>) -> std::io::Result<()> {
        for output in outputs {
            let definitions: Vec<DefinitionRef> = patch_sets(result)
                .into_iter()
                .flat_map(|store| store.iter())
                .filter(|d| d.generated_file_names.contains(output))
                .cloned()
                .collect();
            self.writer.write_output(output, &definitions)?;
        }
        Ok(())
    }

    fn save_state(&self, result: &ConflictResult) -> Result<()> {
        let entries = |store: &IndexedDefinitions| -> Vec<PatchStateEntry> {
            store
                .iter()
                .map(|d| {
                    PatchStateEntry::new(
                        (**d).clone(),
                        result.all_conflicts.get_by_type_and_id(&d.type_name, &d.id),
                    )
                })
                .collect()
        };
        let mut state = PatchState::new(result.mode, self.order.mods().to_vec());
        state.ignored_paths = result.ignored_paths.clone();
        state.resolved = entries(&result.resolved_conflicts);
        state.ignored = entries(&result.ignored_conflicts);
        state.orphaned = entries(&result.orphan_conflicts);
        state.custom = result.custom_conflicts.iter().map(|d| (**d).clone()).collect();
        state.save(&self.writer.state_path())
    }

    /// Drop the resolution of a bucket and reopen it as a conflict.
    pub fn reset_resolved(&self, type_name: &str, id: &str) -> Result<bool> {
        self.reset(type_name, id, CommitTarget::Resolved)
    }

    /// Drop the ignore decision of a bucket and reopen it as a conflict.
    pub fn reset_ignored(&self, type_name: &str, id: &str) -> Result<bool> {
        self.reset(type_name, id, CommitTarget::Ignored)
    }

    /// Remove a user-authored definition from the patch.
    pub fn remove_custom_patch(&self, type_name: &str, id: &str) -> Result<bool> {
        self.reset(type_name, id, CommitTarget::Custom)
    }

    /// Remove a patch entry whose bucket lost its providers.
    pub fn remove_orphan_patch(&self, type_name: &str, id: &str) -> Result<bool> {
        let _guard = ResolutionGuard::acquire(&self.busy)?;
        let mut result = self.lock_for_commit()?;
        if !result.orphan_conflicts.contains(type_name, id) {
            return Ok(false);
        }
        let snapshot = result.snapshot_bucket(type_name, id);
        result.orphan_conflicts.remove_bucket(type_name, id);
        let outputs = Self::affected_outputs_of(&snapshot);
        self.persist_bucket(&mut result, snapshot, &outputs)?;
        Ok(true)
    }

    fn affected_outputs_of(snapshot: &BucketSnapshot) -> BTreeSet<String> {
        snapshot
            .patch_definitions()
            .flat_map(|d| d.generated_file_names.iter().cloned())
            .collect()
    }

    fn reset(&self, type_name: &str, id: &str, target: CommitTarget) -> Result<bool> {
        let _guard = ResolutionGuard::acquire(&self.busy)?;
        let mut result = self.lock_for_commit()?;
        let present = match target {
            CommitTarget::Resolved => result.resolved_conflicts.contains(type_name, id),
            CommitTarget::Ignored => result.ignored_conflicts.contains(type_name, id),
            CommitTarget::Custom => result.custom_conflicts.contains(type_name, id),
        };
        if !present {
            return Ok(false);
        }

        let snapshot = result.snapshot_bucket(type_name, id);
        match target {
            CommitTarget::Resolved => {
                result.resolved_conflicts.remove_bucket(type_name, id);
            }
            CommitTarget::Ignored => {
                result.ignored_conflicts.remove_bucket(type_name, id);
            }
            CommitTarget::Custom => {
                result.custom_conflicts.remove_bucket(type_name, id);
            }
        }
        if target != CommitTarget::Custom {
            let originals = result.all_conflicts.get_by_type_and_id(type_name, id).to_vec();
            result.conflicts.add_all(originals);
        }

        let outputs = Self::affected_outputs_of(&snapshot);
        self.persist_bucket(&mut result, snapshot, &outputs)?;
        tracing::info!("Reset {:?} patch for {}-{}", target, type_name, id);
        Ok(true)
    }

    /// Delete the patch mod and reopen every resolved and ignored bucket.
    pub fn clean_patch(&self) -> Result<()> {
        let _guard = ResolutionGuard::acquire(&self.busy)?;
        let mut result = self.lock_for_commit()?;
        self.writer.clean()?;

        let reopened: Vec<(String, String)> = [&result.resolved_conflicts, &result.ignored_conflicts]
            .into_iter()
            .flat_map(|store| store.buckets())
            .map(|(type_name, id, _)| (type_name.to_string(), id.to_string()))
            .collect();
        result.resolved_conflicts.clear();
        result.ignored_conflicts.clear();
        result.custom_conflicts.clear();
        result.orphan_conflicts.clear();
        for (type_name, id) in reopened {
            let originals = result.all_conflicts.get_by_type_and_id(&type_name, &id).to_vec();
            result.conflicts.add_all(originals);
        }
        Ok(())
    }

    /// Restore decisions recorded in the patch state.
    ///
    /// A resolved or ignored entry is restored only if the bucket's candidates
    /// are the ones it was made against. Changed buckets stay open as
    /// conflicts, and entries with no remaining provider become orphans.
    /// Afterwards the patch files are rewritten to match.
    pub fn initialize_patch_state(&self) -> Result<()> {
        let _guard = ResolutionGuard::acquire(&self.busy)?;
        let mut result = self.lock()?;
        let Some(state) = PatchState::load(&self.writer.state_path())? else {
            tracing::debug!("No patch state for '{}'", self.writer.patch_name());
            return Ok(());
        };

        let mut outputs = BTreeSet::new();
        let (mut restored, mut reopened, mut orphaned) = (0usize, 0usize, 0usize);
        let decided = state
            .resolved
            .iter()
            .map(|e| (e, SavedDecision::Resolved))
            .chain(state.ignored.iter().map(|e| (e, SavedDecision::Ignored)))
            .chain(state.orphaned.iter().map(|e| (e, SavedDecision::Orphaned)));

        for (entry, decision) in decided {
            let definition = &entry.definition;
            outputs.extend(definition.generated_file_names.iter().cloned());
            let (type_name, id) = (definition.type_name.as_str(), definition.id.as_str());
            let candidates = result.all_conflicts.get_by_type_and_id(type_name, id).to_vec();

            if candidates.is_empty() {
                result.detach_bucket(type_name, id);
                result.orphan_conflicts.add(Arc::new(definition.clone()));
                orphaned += 1;
            } else if decision != SavedDecision::Orphaned && entry.matches(&candidates) {
                result.detach_bucket(type_name, id);
                let patch = Arc::new(definition.clone());
                if decision == SavedDecision::Ignored {
                    result.ignored_conflicts.add(patch);
                } else {
                    result.resolved_conflicts.add(patch);
                }
                restored += 1;
            } else {
                result.detach_bucket(type_name, id);
                result.conflicts.add_all(candidates);
                reopened += 1;
            }
        }
        for custom in &state.custom {
            outputs.extend(custom.generated_file_names.iter().cloned());
            result.orphan_conflicts.remove_bucket(&custom.type_name, &custom.id);
            result.custom_conflicts.add(Arc::new(custom.clone()));
        }
        tracing::info!(
            "Patch state for '{}': {} restored, {} reopened, {} orphaned, {} custom",
            self.writer.patch_name(),
            restored,
            reopened,
            orphaned,
            state.custom.len()
        );

        if !result.mode.allows_commits() {
            return Ok(());
        }
        outputs.extend(patch_outputs(&result));
        if !outputs.is_empty() {
            self.writer.write_descriptor(self.order.mods())?;
        }
        self.write_outputs(&result, &outputs)?;
        self.save_state(&result)
    }

    /// Release every definition held by the session.
    pub fn dispose(&self) {
        let mut result = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        if !result.is_disposed() {
            result.dispose();
            tracing::debug!("Disposed conflict session for '{}'", self.writer.patch_name());
        }
    }
}

impl Drop for ConflictSession {
    fn drop(&mut self) {
        let result = self.result.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !result.is_disposed() {
            result.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::{Utf8Path, Utf8PathBuf};
    use pdx_script::definition::Provenance;
    use pdx_script::ValueType;
    use tempfile::{tempdir, TempDir};

    fn def(mod_name: &str, file: &str, id: &str, code: &str) -> DefinitionRef {
        let file = Utf8Path::new(file);
        let provenance = Provenance {
            file,
            full_path: None,
            mod_name,
            dependencies: &[],
        };
        Arc::new(provenance.definition(
            id,
            pdx_script::paths::format_type(file, None),
            code,
            ValueType::Object,
            1,
        ))
    }

    fn session_in(dir: &TempDir, mode: PatchStateMode) -> ConflictSession {
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let game = GameType::stellaris();
        let writer = PatchWriter::new(root, "test", &game);
        let store = IndexedDefinitions::from_definitions(vec![
            def("A", "events/a.txt", "x", "x = { a }"),
            def("B", "events/b.txt", "x", "x = { b }"),
            def("A", "events/a.txt", "y", "y = { a }"),
            def("B", "events/b.txt", "y", "y = { b }"),
        ]);
        ConflictSession::detect(game, ModOrder::new(["A", "B"]), &store, mode, "", writer)
    }

    fn bucket(session: &ConflictSession, id: &str) -> Vec<DefinitionRef> {
        session.candidates("events-txt", id).unwrap()
    }

    #[test]
    fn test_apply_moves_bucket_and_writes_winner() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let candidates = bucket(&session, "x");
        let winner = session.eval_definition_priority(&candidates);
        let winner = winner.definition.unwrap();
        assert_eq!(winner.mod_name, "B");

        assert!(session.apply_mod_patch(&winner).unwrap());
        let summary = session.summary().unwrap();
        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.resolved, 1);

        let text = std::fs::read_to_string(session.writer().patch_dir().join("events/zzz_b.txt")).unwrap();
        assert_eq!(text, "x = { b }\n");
        assert!(session.writer().state_path().exists());
    }

    #[test]
    fn test_failed_state_save_rolls_back_bucket() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let blocker = session.writer().state_path();
        std::fs::create_dir_all(blocker.join("occupied")).unwrap();

        let candidates = bucket(&session, "x");
        let err = session.apply_mod_patch(&candidates[1]).unwrap_err();
        assert!(matches!(err, Error::PatchWrite { ref key, .. } if key == "events-txt-x"));

        session
            .with_result(|r| {
                assert!(r.conflicts.contains("events-txt", "x"));
                assert!(!r.resolved_conflicts.contains("events-txt", "x"));
            })
            .unwrap();
        assert!(!session.writer().patch_dir().join("events/zzz_b.txt").exists());
    }

    #[test]
    fn test_ignore_writes_first_candidate() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let candidates = bucket(&session, "y");
        assert!(session.ignore_mod_patch(&candidates[1]).unwrap());
        session
            .with_result(|r| {
                assert!(!r.conflicts.contains("events-txt", "y"));
                let ignored = r.ignored_conflicts.get_by_type_and_id("events-txt", "y");
                assert_eq!(ignored[0].code, "y = { a }");
            })
            .unwrap();
        let text = std::fs::read_to_string(session.writer().patch_dir().join("events/zzz_a.txt")).unwrap();
        assert_eq!(text, "y = { a }\n");
    }

    #[test]
    fn test_reset_reopens_and_removes_file() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let candidates = bucket(&session, "x");
        session.apply_mod_patch(&candidates[0]).unwrap();
        let output = session.writer().patch_dir().join("events/zzz_a.txt");
        assert!(output.exists());

        assert!(session.reset_resolved("events-txt", "x").unwrap());
        assert!(!output.exists());
        assert_eq!(session.summary().unwrap().conflicts, 2);
        assert!(!session.reset_resolved("events-txt", "x").unwrap());
    }

    #[test]
    fn test_unknown_bucket_is_not_applied() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let stray = def("A", "events/a.txt", "nope", "nope = { }");
        assert!(!session.apply_mod_patch(&stray).unwrap());
    }

    #[test]
    fn test_read_only_rejects_commits() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::ReadOnly);
        let candidates = bucket(&session, "x");
        let err = session.apply_mod_patch(&candidates[0]).unwrap_err();
        assert!(matches!(err, Error::ReadOnlyPatch(_)));
    }

    #[test]
    fn test_concurrent_commit_is_rejected() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let candidates = bucket(&session, "x");
        let _held = ResolutionGuard::acquire(&session.busy).unwrap();
        let err = session.apply_mod_patch(&candidates[0]).unwrap_err();
        assert!(matches!(err, Error::ResolutionInProgress));
    }

    #[test]
    fn test_disposed_session() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        session.dispose();
        assert!(matches!(session.summary(), Err(Error::SessionDisposed)));
    }

    #[test]
    fn test_custom_patch() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        let custom = def("User", "events/custom.txt", "z", "z = { custom }");
        assert!(session.add_custom_patch(&custom).unwrap());
        let output = session.writer().patch_dir().join("events/zzz_custom.txt");
        assert!(output.exists());
        assert!(session.remove_custom_patch("events-txt", "z").unwrap());
        assert!(!output.exists());
    }

    #[test]
    fn test_initialize_restores_matching_state() {
        let dir = tempdir().unwrap();
        {
            let session = session_in(&dir, PatchStateMode::Default);
            let candidates = bucket(&session, "x");
            session.apply_mod_patch(&candidates[1]).unwrap();
        }
        let session = session_in(&dir, PatchStateMode::Default);
        assert_eq!(session.summary().unwrap().conflicts, 2);
        session.initialize_patch_state().unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.resolved, 1);
    }

    #[test]
    fn test_initialize_reopens_changed_and_orphans_missing() {
        let dir = tempdir().unwrap();
        {
            let session = session_in(&dir, PatchStateMode::Default);
            session.apply_mod_patch(&bucket(&session, "x")[1]).unwrap();
            session.ignore_mod_patch(&bucket(&session, "y")[0]).unwrap();
        }

        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let game = GameType::stellaris();
        let writer = PatchWriter::new(root, "test", &game);
        let store = IndexedDefinitions::from_definitions(vec![
            def("A", "events/a.txt", "x", "x = { a2 }"),
            def("B", "events/b.txt", "x", "x = { b }"),
            def("A", "events/a.txt", "y", "y = { a }"),
        ]);
        let session = ConflictSession::detect(
            game,
            ModOrder::new(["A", "B"]),
            &store,
            PatchStateMode::Default,
            "",
            writer,
        );
        session.initialize_patch_state().unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.resolved, 0);
        assert_eq!(summary.orphans, 1);

        assert!(session.remove_orphan_patch("events-txt", "y").unwrap());
        assert_eq!(session.summary().unwrap().orphans, 0);
        assert!(!session.writer().patch_dir().join("events/zzz_a.txt").exists());
    }

    #[test]
    fn test_clean_patch_reopens_everything() {
        let dir = tempdir().unwrap();
        let session = session_in(&dir, PatchStateMode::Default);
        session.apply_mod_patch(&bucket(&session, "x")[0]).unwrap();
        session.clean_patch().unwrap();
        assert!(!session.writer().patch_dir().exists());
        let summary = session.summary().unwrap();
        assert_eq!(summary.conflicts, 2);
        assert_eq!(summary.resolved, 0);
    }
}
