//! Load order snapshot used for every tie-break of one resolution pass.

use serde::{Deserialize, Serialize};

/// Immutable copy of the active mod order, first-loaded first.
///
/// Mods that are not in the snapshot rank before every listed mod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModOrder {
    mods: Vec<String>,
}

impl ModOrder {
    pub fn new(mods: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            mods: mods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn mods(&self) -> &[String] {
        &self.mods
    }

    pub fn position(&self, mod_name: &str) -> Option<usize> {
        self.mods.iter().position(|m| m == mod_name)
    }

    /// Sort key: 0 for unlisted mods, `position + 1` otherwise.
    pub fn rank(&self, mod_name: &str) -> usize {
        self.position(mod_name).map_or(0, |p| p + 1)
    }

    pub fn contains(&self, mod_name: &str) -> bool {
        self.position(mod_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}
