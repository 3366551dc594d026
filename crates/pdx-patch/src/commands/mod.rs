mod clean;
mod conflicts;
pub mod config;
mod parse;
mod resolve;

pub use clean::clean_patch;
pub use conflicts::{show_conflicts, ShowConflictsArgs};
pub use parse::{parse_mod_dir, ParseModArgs};
pub use resolve::{resolve_conflicts, ResolveConflictsArgs};
