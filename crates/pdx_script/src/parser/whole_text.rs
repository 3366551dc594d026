//! Files compared as a single unit.

use super::ParseContext;
use crate::definition::{Definition, ValueType};
use crate::paths::format_type;

/// Any byte difference between two copies is a conflict, so the
/// fingerprint is the raw content hash rather than the normalized one.
pub(super) fn parse_whole_text(ctx: &ParseContext<'_>) -> Vec<Definition> {
    let file = ctx.file();
    let mut def = ctx.provenance.definition(
        file.file_name().unwrap_or_default(),
        ctx.default_type(),
        ctx.lines.join("\n"),
        ValueType::WholeTextFile,
        1,
    );
    def.fingerprint = ctx.content_hash;
    vec![def]
}

pub(super) fn parse_binary(ctx: &ParseContext<'_>) -> Vec<Definition> {
    let file = ctx.file();
    let mut def = ctx.provenance.definition(
        file.file_name().unwrap_or_default(),
        format_type(file, Some("binary")),
        String::new(),
        ValueType::Binary,
        1,
    );
    def.fingerprint = ctx.content_hash;
    vec![def]
}
