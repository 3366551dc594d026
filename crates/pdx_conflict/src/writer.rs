//! Writes resolved definitions into the patch mod directory.
//!
//! The patch mod mirrors the game folder layout. Definitions that came from
//! the same source file name share one output file, prefixed so the game
//! loads it first (`!!!_`, FIOS folders) or last (`zzz_`, everything else).
//! Whole-text and binary files keep their original name because they replace
//! the file as a whole.
//!
//! Every output file is written through a temporary file and renamed into
//! place, so a failed write leaves the previous content intact.

use crate::error::Result;
use crate::state::STATE_FILE;
use crate::store::DefinitionRef;
use camino::{Utf8Path, Utf8PathBuf};
use pdx_script::descriptor::{DESCRIPTOR_FILE, METADATA_DIR, METADATA_FILE};
use pdx_script::{Definition, GameType, ModDescriptor, ModDescriptorType, PriorityRuleTable, ValueType};
use std::collections::BTreeSet;
use std::io::Write;
use tempfile::NamedTempFile;

pub const FIOS_PREFIX: &str = "!!!_";
pub const LIOS_PREFIX: &str = "zzz_";
const PATCH_NAME_PREFIX: &str = "pdx_patch_";
const UTF8_BOM: &str = "\u{feff}";

/// Write bytes to `path` atomically, creating parent directories.
pub fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Utf8Path::new("."));
    std::fs::create_dir_all(parent.as_std_path())?;
    let mut temp = NamedTempFile::new_in(parent.as_std_path())?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path.as_std_path()).map_err(|e| e.error)?;
    Ok(())
}

fn is_localization_output(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    (lower.starts_with("localisation") || lower.starts_with("localization")) && lower.ends_with(".yml")
}

/// `localisation/english-yml` -> `english`
fn language_from_type(type_name: &str) -> &str {
    let base = type_name.strip_suffix("-yml").unwrap_or(type_name);
    base.rsplit('/').next().unwrap_or(base)
}

/// Layout and output of one patch mod.
#[derive(Debug, Clone)]
pub struct PatchWriter {
    patch_root: Utf8PathBuf,
    patch_name: String,
    dir_name: String,
    descriptor_type: ModDescriptorType,
    rules: PriorityRuleTable,
}

impl PatchWriter {
    /// Patch mod named after `collection`, placed under `patch_root`.
    pub fn new(patch_root: impl Into<Utf8PathBuf>, collection: &str, game: &GameType) -> Self {
        let patch_name = Self::patch_mod_name(collection);
        Self {
            patch_root: patch_root.into(),
            dir_name: slug::slugify(&patch_name),
            patch_name,
            descriptor_type: game.descriptor_type,
            rules: game.rules.clone(),
        }
    }

    pub fn patch_mod_name(collection: &str) -> String {
        format!("{PATCH_NAME_PREFIX}{collection}")
    }

    pub fn patch_name(&self) -> &str {
        &self.patch_name
    }

    pub fn patch_dir(&self) -> Utf8PathBuf {
        self.patch_root.join(&self.dir_name)
    }

    pub fn state_path(&self) -> Utf8PathBuf {
        self.patch_dir().join(STATE_FILE)
    }

    /// Outer `<patch>.mod` file used by the legacy launcher.
    pub fn outer_descriptor_path(&self) -> Utf8PathBuf {
        self.patch_root.join(format!("{}.mod", self.dir_name))
    }

    /// Output path, relative to the patch directory, for a definition.
    pub fn output_file(&self, definition: &Definition) -> String {
        if matches!(
            definition.value_type,
            ValueType::WholeTextFile | ValueType::Binary
        ) {
            return definition.file.to_string();
        }
        let prefix = if self.rules.is_fios(definition.file.as_str()) {
            FIOS_PREFIX
        } else {
            LIOS_PREFIX
        };
        let file_name = definition.file_name();
        let file_name = if file_name.starts_with(prefix) {
            file_name.to_string()
        } else {
            format!("{prefix}{file_name}")
        };
        let parent = definition.parent_directory();
        if parent.is_empty() {
            file_name
        } else {
            format!("{parent}/{file_name}")
        }
    }

    /// Copy of `source` as the patch mod contributes it.
    pub fn patch_definition(&self, source: &Definition) -> Definition {
        let output = self.output_file(source);
        let mut definition = source.clone();
        definition.mod_name = self.patch_name.clone();
        definition.file = Utf8PathBuf::from(&output);
        if source.value_type != ValueType::Binary {
            definition.full_path = Some(self.patch_dir().join(&output));
        }
        definition.generated_file_names = BTreeSet::from([output]);
        definition.dependencies.clear();
        definition
    }

    /// Write the patch mod descriptor. The patch depends on every collection mod
    /// so that it always loads after them.
    pub fn write_descriptor(&self, dependencies: &[String]) -> Result<()> {
        let mut descriptor = ModDescriptor::new(&self.patch_name);
        descriptor.tags = vec!["Fixes".to_string()];
        descriptor.dependencies = dependencies.to_vec();

        let patch_dir = self.patch_dir();
        match self.descriptor_type {
            ModDescriptorType::DescriptorMod => {
                write_atomic(
                    &patch_dir.join(DESCRIPTOR_FILE),
                    descriptor.to_descriptor_mod().as_bytes(),
                )?;
                descriptor.path = Some(patch_dir.to_string());
                write_atomic(
                    &self.outer_descriptor_path(),
                    descriptor.to_descriptor_mod().as_bytes(),
                )?;
            }
            ModDescriptorType::JsonMetadata | ModDescriptorType::JsonMetadataV2 => {
                let json = descriptor.to_json_metadata(self.descriptor_type)?;
                write_atomic(
                    &patch_dir.join(METADATA_DIR).join(METADATA_FILE),
                    json.as_bytes(),
                )?;
            }
        }
        tracing::debug!("Wrote patch descriptor for '{}'", self.patch_name);
        Ok(())
    }

    fn render(output: &str, definitions: &[DefinitionRef]) -> std::io::Result<Vec<u8>> {
        if let Some(binary) = definitions.iter().find(|d| d.value_type == ValueType::Binary) {
            let source = binary.full_path.as_ref().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no source file for binary '{}'", binary.file),
                )
            })?;
            return std::fs::read(source.as_std_path());
        }

        let mut sorted: Vec<&DefinitionRef> = definitions.iter().collect();
        sorted.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));

        let mut text = String::new();
        if is_localization_output(output) {
            let language = sorted
                .first()
                .map(|d| language_from_type(&d.type_name))
                .unwrap_or("english");
            text.push_str(UTF8_BOM);
            text.push_str(&format!("l_{language}:\n"));
            for definition in &sorted {
                text.push_str(&format!(" {}\n", definition.code.trim()));
            }
        } else {
            for definition in &sorted {
                text.push_str(definition.code.trim_end());
                text.push('\n');
            }
        }
        Ok(text.into_bytes())
    }

    /// Write one output file from every patch definition mapped to it. An empty
    /// set removes the file.
    pub fn write_output(&self, output: &str, definitions: &[DefinitionRef]) -> std::io::Result<()> {
        let path = self.patch_dir().join(output);
        if definitions.is_empty() {
            if path.as_std_path().exists() {
                std::fs::remove_file(path.as_std_path())?;
                tracing::info!("Removed patch file {}", output);
            }
            return Ok(());
        }
        let bytes = Self::render(output, definitions)?;
        write_atomic(&path, &bytes)?;
        tracing::info!(
            "Wrote patch file {} ({} definitions)",
            output,
            definitions.len()
        );
        Ok(())
    }

    /// Delete the patch mod directory and its outer descriptor.
    pub fn clean(&self) -> Result<()> {
        let patch_dir = self.patch_dir();
        if patch_dir.as_std_path().exists() {
            std::fs::remove_dir_all(patch_dir.as_std_path())?;
        }
        let outer = self.outer_descriptor_path();
        if outer.as_std_path().exists() {
            std::fs::remove_file(outer.as_std_path())?;
        }
        tracing::info!("Cleaned patch mod '{}'", self.patch_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdx_script::definition::Provenance;
    use pdx_script::ParserRegistry;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn def(file: &str, id: &str, code: &str, value_type: ValueType, order: usize) -> Definition {
        let file = Utf8Path::new(file);
        let provenance = Provenance {
            file,
            full_path: None,
            mod_name: "A",
            dependencies: &[],
        };
        provenance.definition(
            id,
            pdx_script::paths::format_type(file, None),
            code,
            value_type,
            order,
        )
    }

    fn writer(root: &Utf8Path) -> PatchWriter {
        PatchWriter::new(root, "My Collection", &GameType::stellaris())
    }

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_naming() {
        let dir = tempdir().unwrap();
        let root = utf8(&dir);
        let writer = writer(&root);
        assert_eq!(writer.patch_name(), "pdx_patch_My Collection");
        assert_eq!(writer.patch_dir(), root.join("pdx-patch-my-collection"));
    }

    #[test]
    fn test_output_file_prefixes() {
        let dir = tempdir().unwrap();
        let writer = writer(&utf8(&dir));
        let lios = def("events/a.txt", "x", "x = 1", ValueType::Variable, 1);
        let fios = def("interface/main.gui", "x", "x = {}", ValueType::Object, 1);
        let whole = def("common/on_actions/00.txt", "00.txt", "a", ValueType::WholeTextFile, 1);
        assert_eq!(writer.output_file(&lios), "events/zzz_a.txt");
        assert_eq!(writer.output_file(&fios), "interface/!!!_main.gui");
        assert_eq!(writer.output_file(&whole), "common/on_actions/00.txt");
    }

    #[test]
    fn test_patch_definition_round_trips_through_parser() {
        let dir = tempdir().unwrap();
        let writer = writer(&utf8(&dir));
        let source = def("events/a.txt", "x", "x = {\n\ta = 1\n}", ValueType::Object, 1);
        let patch = writer.patch_definition(&source);
        assert_eq!(patch.mod_name, "pdx_patch_My Collection");
        assert_eq!(patch.file.as_str(), "events/zzz_a.txt");
        assert_eq!(patch.type_and_id(), source.type_and_id());

        writer
            .write_output("events/zzz_a.txt", &[Arc::new(patch.clone())])
            .unwrap();
        let bytes = std::fs::read(writer.patch_dir().join("events/zzz_a.txt")).unwrap();
        let file = pdx_script::ModFile::new("events/zzz_a.txt", bytes);
        let reparsed = ParserRegistry::generic().parse_file("Patch", &[], &file);
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].type_and_id(), source.type_and_id());
        assert_eq!(reparsed[0].fingerprint, source.fingerprint);
    }

    #[test]
    fn test_coalesced_output_is_ordered_by_appearance() {
        let dir = tempdir().unwrap();
        let writer = writer(&utf8(&dir));
        let second = Arc::new(def("events/a.txt", "y", "y = 2", ValueType::Variable, 2));
        let first = Arc::new(def("events/a.txt", "x", "x = 1", ValueType::Variable, 1));
        writer.write_output("events/zzz_a.txt", &[second, first]).unwrap();
        let text = std::fs::read_to_string(writer.patch_dir().join("events/zzz_a.txt")).unwrap();
        assert_eq!(text, "x = 1\ny = 2\n");

        writer.write_output("events/zzz_a.txt", &[]).unwrap();
        assert!(!writer.patch_dir().join("events/zzz_a.txt").exists());
    }

    #[test]
    fn test_localisation_output_has_header() {
        let dir = tempdir().unwrap();
        let writer = writer(&utf8(&dir));
        let mut loc = def("localisation/english/a_l_english.yml", "k", "k: \"v\"", ValueType::Variable, 1);
        loc.type_name = "localisation/english-yml".to_string();
        let output = writer.output_file(&loc);
        assert_eq!(output, "localisation/english/zzz_a_l_english.yml");
        writer.write_output(&output, &[Arc::new(loc)]).unwrap();
        let text = std::fs::read_to_string(writer.patch_dir().join(&output)).unwrap();
        assert_eq!(text, "\u{feff}l_english:\n k: \"v\"\n");
    }

    #[test]
    fn test_descriptor_and_clean() {
        let dir = tempdir().unwrap();
        let writer = writer(&utf8(&dir));
        writer.write_descriptor(&["A".to_string(), "B".to_string()]).unwrap();

        let inner = std::fs::read_to_string(writer.patch_dir().join(DESCRIPTOR_FILE)).unwrap();
        let parsed = ModDescriptor::parse_descriptor_mod(&inner);
        assert_eq!(parsed.name, "pdx_patch_My Collection");
        assert_eq!(parsed.dependencies, vec!["A", "B"]);
        let outer = std::fs::read_to_string(writer.outer_descriptor_path()).unwrap();
        assert!(outer.contains("path="));

        writer.clean().unwrap();
        assert!(!writer.patch_dir().exists());
        assert!(!writer.outer_descriptor_path().exists());
    }

    #[test]
    fn test_json_metadata_descriptor() {
        let dir = tempdir().unwrap();
        let writer = PatchWriter::new(utf8(&dir), "c", &GameType::victoria3());
        writer.write_descriptor(&[]).unwrap();
        assert!(writer
            .patch_dir()
            .join(METADATA_DIR)
            .join(METADATA_FILE)
            .exists());
    }
}
