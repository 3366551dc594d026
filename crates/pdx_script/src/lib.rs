//! Paradox script parsing for mod conflict resolution.
//!
//! This crate turns the files of a Paradox game mod into [`Definition`]s, the
//! smallest units that two mods can disagree on:
//!
//! - **Scanner**: whitespace-insensitive line scanning with brace tracking
//! - **Parsers**: an ordered registry of game-specific and generic parsers
//! - **Games**: per-game descriptor format, feature level and override rules
//! - **Descriptors**: `descriptor.mod` and `metadata.json` reading and writing
//!
//! # Example
//!
//! ```
//! use pdx_script::{GameType, ModFile, ParserRegistry};
//!
//! let registry = ParserRegistry::for_game(&GameType::stellaris());
//! let file = ModFile::new("common/buildings/00_buildings.txt", "building_a = { cost = 10 }");
//! let definitions = registry.parse_file("My Mod", &[], &file);
//! assert_eq!(definitions[0].type_and_id(), "common/buildings-txt-building_a");
//! ```

pub mod definition;
pub mod descriptor;
pub mod error;
pub mod game;
pub mod parser;
pub mod paths;
pub mod rules;
pub mod scanner;

pub use definition::{code_fingerprint, content_fingerprint, Definition, DefinitionError, ValueType};
pub use descriptor::ModDescriptor;
pub use error::{DescriptorError, ParseError};
pub use game::{GameAdvancedFeatures, GameRegistry, GameType, MergeTypes, ModDescriptorType};
pub use parser::{ModFile, ParseContext, Parser, ParserKind, ParserRegistry};
pub use rules::{PriorityRule, PriorityRuleTable};
