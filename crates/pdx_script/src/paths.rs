//! Relative path helpers shared by the parsers.
//!
//! Paths inside a mod are always handled relative to the mod root with forward
//! slashes. Comparisons are case-insensitive.

use camino::{Utf8Path, Utf8PathBuf};

/// Extensions that are read as script text. Everything else is binary.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "gui", "gfx", "yml", "csv", "shader", "fxh", "asset", "lua", "sfx", "mod",
];

/// Normalize a mod-relative path: forward slashes, no leading separator.
pub fn normalize_path(path: &str) -> Utf8PathBuf {
    let normalized = path.replace('\\', "/");
    Utf8PathBuf::from(normalized.trim_start_matches('/'))
}

/// Lowercased path string used for case-insensitive matching.
pub fn path_ci(path: &Utf8Path) -> String {
    path.as_str().replace('\\', "/").to_lowercase()
}

pub fn extension_ci(path: &Utf8Path) -> String {
    path.extension().unwrap_or_default().to_ascii_lowercase()
}

pub fn is_text_file(path: &Utf8Path) -> bool {
    let ext = extension_ci(path);
    TEXT_EXTENSIONS.contains(&ext.as_str())
}

/// Parent directory as a forward-slash string (`""` for root files).
pub fn parent_directory(path: &Utf8Path) -> String {
    path.parent()
        .map(|p| p.as_str().replace('\\', "/"))
        .unwrap_or_default()
}

/// Definition type for a file.
///
/// The default form is `{parent}-{ext}`, where `ext` is the lowercased
/// extension for text files and `txt` otherwise. An override replaces the
/// extension part and nests under the parent: `{parent}/{override}`.
///
/// - `common/buildings/00.txt` -> `common/buildings-txt`
/// - `common/defines/00.txt` with `NGameplay-txt` -> `common/defines/NGameplay-txt`
pub fn format_type(path: &Utf8Path, kind_override: Option<&str>) -> String {
    let parent = parent_directory(path);
    match kind_override {
        Some(kind) if parent.is_empty() => kind.to_string(),
        Some(kind) => format!("{parent}/{kind}"),
        None => {
            let ext = if is_text_file(path) {
                extension_ci(path)
            } else {
                "txt".to_string()
            };
            if parent.is_empty() {
                ext
            } else {
                format!("{parent}-{ext}")
            }
        }
    }
}

/// Part of a type before its trailing `-kind`, i.e. the category path.
pub fn type_category(type_name: &str) -> &str {
    match type_name.rfind('-') {
        Some(idx) => &type_name[..idx],
        None => type_name,
    }
}
