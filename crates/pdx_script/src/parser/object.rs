//! Top-level object parsing, optionally keyed by an inner identifier.

use super::ParseContext;
use crate::definition::{Definition, ValueType};
use crate::error::ParseError;
use crate::scanner::{
    get_key, get_value, LineScanner, ScannedLine, CLOSE_OBJECT, OPEN_OBJECT, VARIABLE_SEPARATOR,
};

/// Inner keys that identify an object when the key parser is selected by content.
pub const GENERIC_KEY_IDS: &[&str] = &["id=", "name=", "key=", "format=", "world=", "localization="];

struct PendingObject {
    id: String,
    key: Option<String>,
    code: String,
    opened: bool,
    line: usize,
}

/// Value of the first key id that sits directly inside a top-level block.
fn key_candidate(line: &ScannedLine<'_>, key_ids: &[String]) -> Option<String> {
    let lowered = line.cleaned.to_ascii_lowercase();
    key_ids.iter().find_map(|key_id| {
        let value = get_value(line.code, key_id);
        if value.is_empty() {
            return None;
        }
        let idx = lowered.find(&key_id.to_ascii_lowercase())?;
        let prefix = &line.cleaned[..idx];
        let opens = prefix.matches(OPEN_OBJECT).count() as isize;
        let closes = prefix.matches(CLOSE_OBJECT).count() as isize;
        (line.depth_before as isize + opens - closes == 1).then_some(value)
    })
}

/// Whether any top-level block in the file carries one of the key ids.
pub(super) fn has_leading_key(ctx: &ParseContext<'_>, key_ids: &[String]) -> bool {
    LineScanner::new(&ctx.lines, ctx.comment_style())
        .any(|line| key_candidate(&line, key_ids).is_some())
}

pub(super) fn parse(
    ctx: &ParseContext<'_>,
    key_ids: &[String],
) -> Result<Vec<Definition>, ParseError> {
    let type_name = ctx.default_type();
    let mut definitions: Vec<Definition> = Vec::new();
    let mut emit = |id: String, code: String, value_type: ValueType| {
        let order = definitions.len() + 1;
        definitions.push(
            ctx.provenance
                .definition(id, type_name.clone(), code, value_type, order),
        );
    };

    let mut scanner = LineScanner::new(&ctx.lines, ctx.comment_style());
    let mut pending: Option<PendingObject> = None;

    for line in scanner.by_ref() {
        match pending.take() {
            Some(mut object) => {
                object.code.push('\n');
                object.code.push_str(line.raw);
                if object.key.is_none() {
                    object.key = key_candidate(&line, key_ids);
                }
                if !object.opened {
                    if line.is_blank() {
                        pending = Some(object);
                        continue;
                    }
                    if line.opens == 0 {
                        // `key =` with its value on the next line
                        emit(object.id, object.code, ValueType::Variable);
                        continue;
                    }
                    object.opened = true;
                }
                if line.depth_after == 0 {
                    let id = object.key.unwrap_or(object.id);
                    emit(id, object.code, ValueType::Object);
                } else {
                    pending = Some(object);
                }
            }
            None => {
                if line.is_blank() || line.depth_before > 0 {
                    continue;
                }
                if line.is_block_start() {
                    let id = get_key(line.code, VARIABLE_SEPARATOR);
                    if id.is_empty() {
                        return Err(ParseError::Syntax {
                            line: line.number,
                            column: 1,
                            message: "Block without a key".to_string(),
                        });
                    }
                    let object = PendingObject {
                        id,
                        key: key_candidate(&line, key_ids),
                        code: line.raw.to_string(),
                        opened: line.opens > 0,
                        line: line.number,
                    };
                    if object.opened && line.depth_after == 0 {
                        let id = object.key.unwrap_or(object.id);
                        emit(id, object.code, ValueType::Object);
                    } else {
                        pending = Some(object);
                    }
                } else if line.is_assignment() {
                    let id = get_key(line.code, VARIABLE_SEPARATOR);
                    if id.is_empty() {
                        continue;
                    }
                    let value_type = if id.eq_ignore_ascii_case("namespace") {
                        ValueType::Namespace
                    } else {
                        ValueType::Variable
                    };
                    emit(id, line.raw.to_string(), value_type);
                }
            }
        }
    }

    if let Some(anomaly) = scanner.finish().first() {
        return Err((*anomaly).into());
    }
    if let Some(object) = pending {
        return Err(ParseError::Syntax {
            line: object.line,
            column: 1,
            message: format!("Missing value for '{}'", object.id),
        });
    }
    Ok(definitions)
}
