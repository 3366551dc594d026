//! Parallel parse pass over a set of mods.

use crate::content::ModSource;
use crate::error::Result;
use crate::store::IndexedDefinitions;
use pdx_script::{Definition, ParserRegistry};
use rayon::prelude::*;
use std::sync::Arc;

/// Definitions produced from one mod.
#[derive(Debug, Clone)]
pub struct ParsedMod {
    pub name: String,
    pub dependencies: Vec<String>,
    pub definitions: Vec<Definition>,
}

/// Parse every file of one mod.
pub fn parse_mod(source: &mut dyn ModSource, registry: &ParserRegistry) -> Result<ParsedMod> {
    let descriptor = source.descriptor()?;
    let files = source.read_files()?;
    let definitions = registry.parse_mod(&descriptor.name, &descriptor.dependencies, &files);
    tracing::info!(
        "Parsed mod '{}': {} files, {} definitions",
        descriptor.name,
        files.len(),
        definitions.len()
    );
    Ok(ParsedMod {
        name: descriptor.name,
        dependencies: descriptor.dependencies,
        definitions,
    })
}

/// Parse mods in parallel and merge them, in the given order, into one store.
///
/// Each mod is parsed independently on the rayon pool; merging happens on the
/// calling thread once every parse has finished.
pub fn parse_mods(
    sources: Vec<Box<dyn ModSource>>,
    registry: &ParserRegistry,
) -> Result<(Vec<ParsedMod>, IndexedDefinitions)> {
    let parsed = sources
        .into_par_iter()
        .map(|mut source| parse_mod(source.as_mut(), registry))
        .collect::<Result<Vec<_>>>()?;

    let mut store = IndexedDefinitions::new();
    for parsed_mod in &parsed {
        store.add_all(parsed_mod.definitions.iter().cloned().map(Arc::new));
    }
    tracing::info!(
        "Merged {} mods into {} definitions",
        parsed.len(),
        store.len()
    );
    Ok((parsed, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryModSource;
    use pdx_script::{ModDescriptor, ModFile};

    fn source(name: &str, files: &[(&str, &str)]) -> Box<dyn ModSource> {
        Box::new(MemoryModSource::new(
            ModDescriptor::new(name),
            files
                .iter()
                .map(|(path, text)| ModFile::new(*path, text.as_bytes()))
                .collect(),
        ))
    }

    #[test]
    fn test_parse_mods_merges_in_order() {
        let registry = ParserRegistry::generic();
        let (parsed, store) = parse_mods(
            vec![
                source("A", &[("events/a.txt", "x = { a }")]),
                source("B", &[("events/b.txt", "x = { b }\ny = 1")]),
            ],
            &registry,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "A");
        assert_eq!(parsed[1].definitions.len(), 2);
        let bucket = store.get_by_type_and_id("events-txt", "x");
        assert_eq!(bucket.len(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_invalid_file_does_not_abort_mod() {
        let registry = ParserRegistry::generic();
        let (parsed, _) = parse_mods(
            vec![source("A", &[("events/bad.txt", "x = {"), ("events/ok.txt", "y = 1")])],
            &registry,
        )
        .unwrap();
        assert_eq!(parsed[0].definitions.len(), 2);
        assert!(parsed[0].definitions[0].is_invalid());
    }
}
