//! Mod content provider abstraction.
//!
//! The [`ModSource`] trait decouples parsing from how a mod is stored. The
//! crate ships [`FsModSource`] for installed mod directories and
//! [`MemoryModSource`] for content that is already in memory.

use crate::error::{Error, Result};
use crate::state::STATE_FILE;
use camino::{Utf8Path, Utf8PathBuf};
use pdx_script::descriptor::{DESCRIPTOR_FILE, METADATA_DIR, METADATA_FILE};
use pdx_script::{ModDescriptor, ModFile};
use walkdir::WalkDir;

/// Provides the metadata and game files of one mod.
///
/// Implementations must be [`Send`] so mods can be read on worker threads.
pub trait ModSource: Send {
    /// Name and dependency list of the mod.
    fn descriptor(&mut self) -> Result<ModDescriptor>;

    /// Every game file of the mod, with paths relative to the mod root.
    fn read_files(&mut self) -> Result<Vec<ModFile>>;
}

/// Files that belong to the mod packaging rather than the game.
fn is_packaging_file(rel: &Utf8Path) -> bool {
    let name = rel.file_name().unwrap_or_default().to_ascii_lowercase();
    rel.components().count() == 1
        && (name == DESCRIPTOR_FILE
            || name == STATE_FILE
            || name.starts_with("thumbnail.")
            || name.ends_with(".mod")
            || name.ends_with(".md"))
}

/// Filesystem-backed mod source.
///
/// ```text
/// mod_dir/
///   descriptor.mod        # or .metadata/metadata.json
///   thumbnail.png         # skipped
///   common/
///     buildings/
///       00_buildings.txt
///   events/
///     my_events.txt
/// ```
///
/// Hidden directories (`.metadata`, `.git`, ...) are not read.
pub struct FsModSource {
    mod_dir: Utf8PathBuf,
}

impl FsModSource {
    pub fn new(mod_dir: Utf8PathBuf) -> Self {
        Self { mod_dir }
    }

    pub fn mod_dir(&self) -> &Utf8Path {
        &self.mod_dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if self.mod_dir.as_std_path().is_dir() {
            Ok(())
        } else {
            Err(Error::InvalidModDir(self.mod_dir.clone()))
        }
    }
}

impl ModSource for FsModSource {
    fn descriptor(&mut self) -> Result<ModDescriptor> {
        self.ensure_dir()?;
        let descriptor_path = self.mod_dir.join(DESCRIPTOR_FILE);
        let metadata_path = self.mod_dir.join(METADATA_DIR).join(METADATA_FILE);

        let mut descriptor = if descriptor_path.as_std_path().exists() {
            let text = std::fs::read_to_string(descriptor_path.as_std_path())?;
            ModDescriptor::parse_descriptor_mod(&text)
        } else if metadata_path.as_std_path().exists() {
            let text = std::fs::read_to_string(metadata_path.as_std_path())?;
            ModDescriptor::parse_json_metadata(&text)?
        } else {
            ModDescriptor::default()
        };
        if descriptor.name.trim().is_empty() {
            descriptor.name = self.mod_dir.file_name().unwrap_or_default().to_string();
        }
        Ok(descriptor)
    }

    fn read_files(&mut self) -> Result<Vec<ModFile>> {
        self.ensure_dir()?;
        let mut files = Vec::new();
        let walker = WalkDir::new(self.mod_dir.as_std_path())
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| Error::Other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(p) => p,
                Err(p) => {
                    tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                    continue;
                }
            };
            let rel = path.strip_prefix(&self.mod_dir).unwrap_or(&path).to_path_buf();
            if is_packaging_file(&rel) {
                continue;
            }
            let bytes = std::fs::read(path.as_std_path())?;
            files.push(ModFile::new(rel.as_str(), bytes).with_full_path(path));
        }
        tracing::debug!("Read {} files from {}", files.len(), self.mod_dir);
        Ok(files)
    }
}

/// In-memory mod source.
#[derive(Debug, Clone)]
pub struct MemoryModSource {
    descriptor: ModDescriptor,
    files: Vec<ModFile>,
}

impl MemoryModSource {
    pub fn new(descriptor: ModDescriptor, files: Vec<ModFile>) -> Self {
        Self { descriptor, files }
    }
}

impl ModSource for MemoryModSource {
    fn descriptor(&mut self) -> Result<ModDescriptor> {
        Ok(self.descriptor.clone())
    }

    fn read_files(&mut self) -> Result<Vec<ModFile>> {
        Ok(self.files.clone())
    }
}
