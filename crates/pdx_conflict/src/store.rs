//! Multi-valued definition store keyed by type and id.
//!
//! Every `(type, id)` pair maps to a bucket holding the definitions that all
//! mods contributed for it. Buckets are grouped under their type, which is
//! also the parent node of the hierarchical projection.

use itertools::Itertools;
use pdx_script::{Definition, ValueType};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Shared handle to an immutable definition.
pub type DefinitionRef = Arc<Definition>;

/// Definitions indexed by type, then id.
#[derive(Debug, Clone, Default)]
pub struct IndexedDefinitions {
    types: BTreeMap<String, BTreeMap<String, Vec<DefinitionRef>>>,
}

/// One leaf of the hierarchy: a single conflict bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalChild {
    /// `"{type}-{id}"`
    pub key: String,
    pub id: String,
    pub file_names: BTreeSet<String>,
    pub mods: Vec<String>,
    /// Definitions contributed by something other than a regular mod, such as
    /// custom patches.
    pub non_game_definitions: usize,
}

/// One parent node of the hierarchy, grouping buckets by type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalDefinition {
    pub name: String,
    pub children: Vec<HierarchicalChild>,
}

impl IndexedDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = DefinitionRef>) -> Self {
        let mut store = Self::new();
        store.add_all(definitions);
        store
    }

    /// Add a definition. Repeated additions of the same definition produce
    /// separate entries in its bucket.
    pub fn add(&mut self, definition: DefinitionRef) {
        self.types
            .entry(definition.type_name.clone())
            .or_default()
            .entry(definition.id.clone())
            .or_default()
            .push(definition);
    }

    pub fn add_all(&mut self, definitions: impl IntoIterator<Item = DefinitionRef>) {
        for definition in definitions {
            self.add(definition);
        }
    }

    pub fn get_by_type_and_id(&self, type_name: &str, id: &str) -> &[DefinitionRef] {
        self.types
            .get(type_name)
            .and_then(|ids| ids.get(id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, type_name: &str, id: &str) -> bool {
        !self.get_by_type_and_id(type_name, id).is_empty()
    }

    pub fn get_by_type(&self, type_name: &str) -> Vec<DefinitionRef> {
        self.types
            .get(type_name)
            .map(|ids| ids.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_by_value_type(&self, value_type: ValueType) -> Vec<DefinitionRef> {
        self.iter()
            .filter(|d| d.value_type == value_type)
            .cloned()
            .collect()
    }

    /// Definitions whose source file matches, compared case-insensitively.
    pub fn get_by_file(&self, file: &str) -> Vec<DefinitionRef> {
        let file = file.replace('\\', "/").to_lowercase();
        self.iter()
            .filter(|d| d.file_ci() == file)
            .cloned()
            .collect()
    }

    pub fn get_by_mod(&self, mod_name: &str) -> Vec<DefinitionRef> {
        self.iter()
            .filter(|d| d.mod_name == mod_name)
            .cloned()
            .collect()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Every bucket as `(type, id, definitions)`, in key order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &str, &[DefinitionRef])> {
        self.types.iter().flat_map(|(type_name, ids)| {
            ids.iter()
                .map(move |(id, defs)| (type_name.as_str(), id.as_str(), defs.as_slice()))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinitionRef> {
        self.types.values().flat_map(|ids| ids.values().flatten())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn bucket_count(&self) -> usize {
        self.types.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Remove entries equal to `definition` from its bucket, pruning the
    /// bucket and its type when they become empty. Returns how many entries
    /// were removed.
    pub fn remove(&mut self, definition: &Definition) -> usize {
        let Some(ids) = self.types.get_mut(&definition.type_name) else {
            return 0;
        };
        let Some(bucket) = ids.get_mut(&definition.id) else {
            return 0;
        };
        let before = bucket.len();
        bucket.retain(|d| d.as_ref() != definition);
        let removed = before - bucket.len();
        if bucket.is_empty() {
            ids.remove(&definition.id);
        }
        if ids.is_empty() {
            self.types.remove(&definition.type_name);
        }
        removed
    }

    /// Remove a whole bucket, returning its definitions.
    pub fn remove_bucket(&mut self, type_name: &str, id: &str) -> Vec<DefinitionRef> {
        let Some(ids) = self.types.get_mut(type_name) else {
            return Vec::new();
        };
        let removed = ids.remove(id).unwrap_or_default();
        if ids.is_empty() {
            self.types.remove(type_name);
        }
        removed
    }

    /// Drop every definition.
    pub fn clear(&mut self) {
        self.types.clear();
    }

    /// Project buckets into a type -> bucket tree. Does not mutate the store.
    pub fn get_hierarchical_definitions(&self) -> Vec<HierarchicalDefinition> {
        self.types
            .iter()
            .map(|(type_name, ids)| HierarchicalDefinition {
                name: type_name.clone(),
                children: ids
                    .iter()
                    .filter_map(|(id, defs)| {
                        let first = defs.first()?;
                        Some(HierarchicalChild {
                            key: first.type_and_id(),
                            id: id.clone(),
                            file_names: defs.iter().map(|d| d.file.to_string()).collect(),
                            mods: defs.iter().map(|d| d.mod_name.clone()).unique().collect(),
                            non_game_definitions: defs.iter().filter(|d| d.is_custom_patch).count(),
                        })
                    })
                    .collect(),
            })
            .collect()
    }
}
