//! Conflict detection and patch generation for Paradox game mods.
//!
//! This crate takes the definitions parsed by [`pdx_script`] from every mod of
//! a load order, finds the `(type, id)` buckets that more than one mod
//! contributes, decides which contribution wins, and writes the user's
//! decisions into a generated patch mod that loads after the collection.
//!
//! # Pipeline
//!
//! 1. **Read**: each mod is read through a [`ModSource`] ([`FsModSource`] for
//!    installed mods).
//! 2. **Parse**: [`parse_mods`] parses mods in parallel and merges them, in
//!    load order, into one [`IndexedDefinitions`].
//! 3. **Detect**: [`ConflictDetector`] classifies every bucket into the sets
//!    of a [`ConflictResult`].
//! 4. **Resolve**: [`PriorityResolver`] picks the winner of a bucket and names
//!    the rule that decided it ([`PriorityType`]).
//! 5. **Commit**: a [`ConflictSession`] applies or ignores buckets, writing
//!    the patch mod through a [`PatchWriter`] and persisting a [`PatchState`].
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use pdx_conflict::{parse_mods, ConflictSession, FsModSource, ModOrder, ModSource, PatchStateMode, PatchWriter};
//! use pdx_script::{GameType, ParserRegistry};
//!
//! # fn main() -> pdx_conflict::Result<()> {
//! let game = GameType::stellaris();
//! let registry = ParserRegistry::for_game(&game);
//! let sources: Vec<Box<dyn ModSource>> = vec![
//!     Box::new(FsModSource::new(Utf8PathBuf::from("mods/first"))),
//!     Box::new(FsModSource::new(Utf8PathBuf::from("mods/second"))),
//! ];
//! let (parsed, definitions) = parse_mods(sources, &registry)?;
//! let order = ModOrder::new(parsed.iter().map(|m| m.name.clone()));
//!
//! let writer = PatchWriter::new("mods", "My Collection", &game);
//! let session = ConflictSession::detect(game, order, &definitions, PatchStateMode::Default, "", writer);
//! session.initialize_patch_state()?;
//!
//! for (type_name, id) in session.conflict_keys()? {
//!     let candidates = session.candidates(&type_name, &id)?;
//!     if let Some(winner) = session.eval_definition_priority(&candidates).definition {
//!         session.apply_mod_patch(&winner)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod conflict_result;
pub mod content;
pub mod detector;
pub mod error;
pub mod ignore;
pub mod order;
pub mod pipeline;
pub mod priority;
pub mod session;
pub mod state;
pub mod store;
pub mod writer;

pub use conflict_result::{ConflictResult, ConflictSummary, PatchStateMode};
pub use content::{FsModSource, MemoryModSource, ModSource};
pub use detector::{build_conflict_result, ConflictDetector};
pub use error::{Error, Result};
pub use ignore::IgnoreRules;
pub use order::ModOrder;
pub use pipeline::{parse_mod, parse_mods, ParsedMod};
pub use priority::{PriorityDefinitionResult, PriorityResolver, PriorityType};
pub use session::ConflictSession;
pub use state::{PatchState, PatchStateEntry};
pub use store::{DefinitionRef, HierarchicalChild, HierarchicalDefinition, IndexedDefinitions};
pub use writer::PatchWriter;
