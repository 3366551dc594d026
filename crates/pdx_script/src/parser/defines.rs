//! `common/defines` files.
//!
//! Each entry of a top-level block (`NGameplay = { A = 1 B = 2 }`) is an
//! independent override point, so every entry becomes its own variable
//! definition typed by the enclosing block. Nested blocks are kept together
//! as one entry. Dotted Lua assignments (`NDefines.NGame.X = 1`) are typed by
//! their prefix.

use super::ParseContext;
use crate::definition::{Definition, ValueType};
use crate::error::ParseError;
use crate::paths::format_type;
use crate::scanner::{get_key, LineScanner, BLOCK_SEPARATOR, CLOSE_OBJECT, VARIABLE_SEPARATOR};

struct NestedEntry {
    key: String,
    lines: Vec<String>,
}

/// Fold state threaded through the line loop.
#[derive(Default)]
struct DefinesState {
    block: Option<String>,
    nested: Option<NestedEntry>,
    definitions: Vec<Definition>,
}

impl DefinesState {
    fn emit(&mut self, ctx: &ParseContext<'_>, block: &str, key: &str, content: &str) {
        let order = self.definitions.len() + 1;
        self.definitions.push(ctx.provenance.definition(
            key,
            format_type(ctx.file(), Some(&format!("{block}-txt"))),
            format!("{block}={{\n{content}\n}}"),
            ValueType::Variable,
            order,
        ));
    }

    fn emit_entry(&mut self, ctx: &ParseContext<'_>, block: &str, content: &str) {
        let key = get_key(content, VARIABLE_SEPARATOR);
        if key.is_empty() {
            return;
        }
        self.emit(ctx, block, &key, content);
    }
}

fn strip_block_close(content: &str) -> &str {
    content
        .strip_suffix(CLOSE_OBJECT)
        .unwrap_or(content)
        .trim_end()
}

pub(super) fn parse(ctx: &ParseContext<'_>) -> Result<Vec<Definition>, ParseError> {
    let mut scanner = LineScanner::new(&ctx.lines, ctx.comment_style());
    let mut state = DefinesState::default();

    for line in scanner.by_ref() {
        if line.is_blank() {
            continue;
        }
        let closes_block = line.depth_after == 0;

        match state.block.take() {
            None => {
                if line.cleaned.contains(BLOCK_SEPARATOR) {
                    let block = get_key(line.code, VARIABLE_SEPARATOR);
                    let rest = line
                        .cleaned
                        .split_once(BLOCK_SEPARATOR)
                        .map(|(_, rest)| rest)
                        .unwrap_or_default();
                    let content = if closes_block { strip_block_close(rest) } else { rest };
                    if !content.is_empty() {
                        state.emit_entry(ctx, &block, content);
                    }
                    if !closes_block {
                        state.block = Some(block);
                    }
                } else if line.depth_before == 0 && line.is_assignment() {
                    let key = get_key(line.code, VARIABLE_SEPARATOR);
                    if let Some((prefix, name)) = key.rsplit_once('.') {
                        let content = line.cleaned.trim_end_matches([',', ';']);
                        let content = content.strip_prefix(prefix).unwrap_or(content);
                        let content = content.trim_start_matches('.');
                        state.emit(ctx, prefix, name, content);
                    }
                }
            }
            Some(block) => {
                let content = if closes_block {
                    strip_block_close(&line.cleaned)
                } else {
                    line.cleaned.as_str()
                };
                let content = content.trim_end_matches(',');

                if let Some(mut nested) = state.nested.take() {
                    if !content.is_empty() {
                        nested.lines.push(content.to_string());
                    }
                    if line.depth_after <= 1 {
                        let joined = nested.lines.join("\n");
                        state.emit(ctx, &block, &nested.key, &joined);
                    } else {
                        state.nested = Some(nested);
                    }
                } else if line.depth_after > 1 {
                    state.nested = Some(NestedEntry {
                        key: get_key(content, VARIABLE_SEPARATOR),
                        lines: vec![content.to_string()],
                    });
                } else if !content.is_empty() {
                    state.emit_entry(ctx, &block, content);
                }

                if !closes_block {
                    state.block = Some(block);
                }
            }
        }
    }

    if let Some(anomaly) = scanner.finish().first() {
        return Err((*anomaly).into());
    }
    Ok(state.definitions)
}
