//! The unit of comparison: one top-level construct parsed from one file of one mod.

use crate::paths::{parent_directory, path_ci};
use crate::scanner::{normalized_lines, split_lines, CommentStyle};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use xxhash_rust::xxh3::xxh3_64;

/// What kind of construct a [`Definition`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// `key = value`
    Variable,
    /// `namespace = x` declarations. Never conflict candidates.
    Namespace,
    /// `key = { ... }`
    Object,
    /// A file compared as a whole.
    WholeTextFile,
    /// A non-text file, compared by content hash.
    Binary,
    /// A file that failed to parse.
    Invalid,
}

/// Location and message of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// A parsed script construct with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub id: String,
    /// Category plus kind, e.g. `common/buildings-txt`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Path relative to the mod root.
    pub file: Utf8PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<Utf8PathBuf>,
    pub code: String,
    pub mod_name: String,
    pub value_type: ValueType,
    /// Files this definition is emitted to when written into a patch.
    #[serde(default)]
    pub generated_file_names: BTreeSet<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// 1-based emission order within its file.
    pub order: usize,
    pub fingerprint: u64,
    #[serde(default)]
    pub is_custom_patch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DefinitionError>,
}

impl Definition {
    /// Conflict bucket key: `"{type}-{id}"`.
    pub fn type_and_id(&self) -> String {
        format!("{}-{}", self.type_name, self.id)
    }

    pub fn file_ci(&self) -> String {
        path_ci(&self.file)
    }

    pub fn file_name(&self) -> &str {
        self.file.file_name().unwrap_or_default()
    }

    pub fn parent_directory(&self) -> String {
        parent_directory(&self.file)
    }

    pub fn is_invalid(&self) -> bool {
        self.value_type == ValueType::Invalid
    }

    /// Whether this definition can take part in a conflict bucket.
    pub fn is_conflict_candidate(&self) -> bool {
        !matches!(self.value_type, ValueType::Invalid | ValueType::Namespace)
    }

    pub fn comment_style(&self) -> CommentStyle {
        CommentStyle::for_file(&self.file)
    }

    /// Recompute the fingerprint from the current code. Binary and
    /// whole-text definitions keep their content hash.
    pub fn refresh_fingerprint(&mut self) {
        if !matches!(self.value_type, ValueType::Binary | ValueType::WholeTextFile) {
            self.fingerprint = code_fingerprint(&self.code, self.comment_style());
        }
    }
}

/// Hash of code with comments, blank lines and formatting removed.
///
/// Two blocks that differ only in whitespace, tabs or comments hash equal.
pub fn code_fingerprint(code: &str, style: CommentStyle) -> u64 {
    let lines = split_lines(code);
    xxh3_64(normalized_lines(&lines, style).join("\n").as_bytes())
}

/// Hash of raw file bytes, used for binary files.
pub fn content_fingerprint(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// Provenance shared by every definition produced from one file.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub file: &'a Utf8Path,
    pub full_path: Option<&'a Utf8Path>,
    pub mod_name: &'a str,
    pub dependencies: &'a [String],
}

impl Provenance<'_> {
    /// Build a definition, computing its fingerprint from `code`.
    pub fn definition(
        &self,
        id: impl Into<String>,
        type_name: impl Into<String>,
        code: impl Into<String>,
        value_type: ValueType,
        order: usize,
    ) -> Definition {
        let code = code.into();
        let fingerprint = code_fingerprint(&code, CommentStyle::for_file(self.file));
        Definition {
            id: id.into(),
            type_name: type_name.into(),
            file: self.file.to_path_buf(),
            full_path: self.full_path.map(Utf8Path::to_path_buf),
            code,
            mod_name: self.mod_name.to_string(),
            value_type,
            generated_file_names: BTreeSet::from([self.file.as_str().to_string()]),
            dependencies: self.dependencies.to_vec(),
            order,
            fingerprint,
            is_custom_patch: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provenance<'a>(file: &'a Utf8Path) -> Provenance<'a> {
        Provenance {
            file,
            full_path: None,
            mod_name: "Test Mod",
            dependencies: &[],
        }
    }

    #[test]
    fn test_type_and_id() {
        let file = Utf8Path::new("common/buildings/00_buildings.txt");
        let def = provenance(file).definition(
            "building_a",
            "common/buildings-txt",
            "building_a = { }",
            ValueType::Object,
            1,
        );
        assert_eq!(def.type_and_id(), "common/buildings-txt-building_a");
        assert_eq!(def.file_name(), "00_buildings.txt");
        assert_eq!(def.parent_directory(), "common/buildings");
        assert!(def.generated_file_names.contains("common/buildings/00_buildings.txt"));
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let a = code_fingerprint("a = {\n\tb = c # note\n}", CommentStyle::Hash);
        let b = code_fingerprint("a={\n    b   =   c\n\n}", CommentStyle::Hash);
        let c = code_fingerprint("a = {\n\tb = d\n}", CommentStyle::Hash);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_namespace_is_not_a_candidate() {
        let file = Utf8Path::new("events/a.txt");
        let def = provenance(file).definition(
            "namespace",
            "events-txt",
            "namespace = a",
            ValueType::Namespace,
            1,
        );
        assert!(!def.is_conflict_candidate());
    }

    #[test]
    fn test_serialized_type_field() {
        let file = Utf8Path::new("events/a.txt");
        let def = provenance(file).definition("x", "events-txt", "x = 1", ValueType::Variable, 1);
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "events-txt");
        assert_eq!(json["valueType"], "variable");
        let back: Definition = serde_json::from_value(json).unwrap();
        assert_eq!(back, def);
    }
}
