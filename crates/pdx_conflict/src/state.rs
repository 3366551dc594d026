//! Patch state persistence.
//!
//! Every commit writes a [`PatchState`] to `state.json` inside the patch mod
//! directory. When a session starts again, the state is compared against the
//! freshly detected buckets: a resolution is restored only if the candidates
//! it was made against are unchanged.

use crate::conflict_result::PatchStateMode;
use crate::error::Result;
use crate::store::DefinitionRef;
use crate::writer::write_atomic;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use pdx_script::Definition;
use serde::{Deserialize, Serialize};

pub const STATE_FILE: &str = "state.json";
const STATE_VERSION: u32 = 1;

/// Fingerprint of one candidate a resolution was made against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFingerprint {
    pub mod_name: String,
    pub fingerprint: u64,
}

/// One committed bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchStateEntry {
    /// The definition written to the patch mod.
    pub definition: Definition,
    /// Sorted candidate fingerprints at commit time.
    pub candidates: Vec<CandidateFingerprint>,
}

impl PatchStateEntry {
    pub fn new(definition: Definition, candidates: &[DefinitionRef]) -> Self {
        Self {
            definition,
            candidates: candidate_fingerprints(candidates),
        }
    }

    /// Whether the current candidates are the ones this entry was made against.
    pub fn matches(&self, candidates: &[DefinitionRef]) -> bool {
        self.candidates == candidate_fingerprints(candidates)
    }
}

pub fn candidate_fingerprints(candidates: &[DefinitionRef]) -> Vec<CandidateFingerprint> {
    let mut fingerprints: Vec<CandidateFingerprint> = candidates
        .iter()
        .map(|d| CandidateFingerprint {
            mod_name: d.mod_name.clone(),
            fingerprint: d.fingerprint,
        })
        .collect();
    fingerprints.sort();
    fingerprints.dedup();
    fingerprints
}

/// Snapshot of the patch mod, persisted as `state.json`.
///
/// # JSON format
///
/// ```json
/// {
///   "version": 1,
///   "mode": "default",
///   "loadOrder": ["Mod A", "Mod B"],
///   "ignoredPaths": "",
///   "updatedAt": "2024-01-01T00:00:00Z",
///   "resolved": [{ "definition": { ... }, "candidates": [ ... ] }],
///   "ignored": [],
///   "custom": [],
///   "orphaned": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchState {
    pub version: u32,
    pub mode: PatchStateMode,
    pub load_order: Vec<String>,
    #[serde(default)]
    pub ignored_paths: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: Vec<PatchStateEntry>,
    #[serde(default)]
    pub ignored: Vec<PatchStateEntry>,
    #[serde(default)]
    pub custom: Vec<Definition>,
    /// Entries whose bucket lost every provider. Still written to the patch
    /// until removed.
    #[serde(default)]
    pub orphaned: Vec<PatchStateEntry>,
}

impl Default for PatchState {
    fn default() -> Self {
        Self::new(PatchStateMode::Default, Vec::new())
    }
}

impl PatchState {
    pub fn new(mode: PatchStateMode, load_order: Vec<String>) -> Self {
        Self {
            version: STATE_VERSION,
            mode,
            load_order,
            ignored_paths: String::new(),
            updated_at: Utc::now(),
            resolved: Vec::new(),
            ignored: Vec::new(),
            custom: Vec::new(),
            orphaned: Vec::new(),
        }
    }

    /// Load state from a file.
    ///
    /// Returns `Ok(None)` if the file doesn't exist and `Err` if it cannot be
    /// parsed.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        let state: Self = serde_json::from_str(&contents)?;
        if state.version != STATE_VERSION {
            tracing::warn!(
                "Ignoring patch state version {} at {}",
                state.version,
                path
            );
            return Ok(None);
        }
        Ok(Some(state))
    }

    /// Save state to a file, creating parent directories if needed.
    ///
    /// The file is replaced atomically; a failed save leaves the previous
    /// state in place.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        write_atomic(path, contents.as_bytes())?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
            && self.ignored.is_empty()
            && self.custom.is_empty()
            && self.orphaned.is_empty()
    }
}
