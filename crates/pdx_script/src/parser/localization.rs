//! `l_<language>:` yaml localisation files.

use super::ParseContext;
use crate::definition::{Definition, ValueType};
use crate::error::ParseError;
use crate::scanner::{strip_comment, CommentStyle, QUOTE};

const YML_SEPARATOR: char = ':';

pub(super) fn can_parse(file_ci: &str) -> bool {
    (file_ci.starts_with("localisation") || file_ci.starts_with("localization"))
        && file_ci.ends_with(".yml")
}

/// `l_english:` -> `english`
fn language_id(line: &str) -> Option<&str> {
    let header = line.strip_suffix(YML_SEPARATOR)?;
    let lang = header.strip_prefix("l_")?;
    (!lang.is_empty() && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .then_some(lang)
}

/// `some_file_l_english.yml` -> `english`
fn language_from_file_name(file_name: &str) -> Option<&str> {
    let stem = file_name.rsplit_once('.').map(|(stem, _)| stem)?;
    let idx = stem.rfind("_l_")?;
    Some(&stem[idx + 3..]).filter(|lang| !lang.is_empty())
}

pub(super) fn parse(ctx: &ParseContext<'_>) -> Result<Vec<Definition>, ParseError> {
    let file = ctx.file();
    let root = file.as_str().split('/').next().unwrap_or_default();
    let file_language = file
        .file_name()
        .and_then(language_from_file_name)
        .map(str::to_ascii_lowercase);

    let mut language: Option<String> = None;
    let mut definitions = Vec::new();
    for (idx, line) in ctx.lines.iter().enumerate() {
        let cleaned = strip_comment(line, CommentStyle::Hash).trim();
        if cleaned.is_empty() {
            continue;
        }
        if let Some(lang) = language_id(cleaned) {
            // the file name wins over a mismatched header
            language = Some(file_language.clone().unwrap_or_else(|| lang.to_ascii_lowercase()));
            continue;
        }
        let Some(lang) = language.as_deref() else {
            continue;
        };
        let Some(sep) = cleaned.find(YML_SEPARATOR).filter(|&i| i > 0) else {
            return Err(ParseError::Syntax {
                line: idx + 1,
                column: 1,
                message: "Missing key separator".to_string(),
            });
        };
        let key = &cleaned[..sep];
        let rest = &cleaned[sep + 1..];
        let Some(quote) = rest.find(QUOTE) else {
            return Err(ParseError::Syntax {
                line: idx + 1,
                column: sep + 2,
                message: format!("Invalid quotes for key '{key}'"),
            });
        };
        // version numbers are dropped so they never cause differences
        let code = format!("{key}: {}", &rest[quote..]);
        let order = definitions.len() + 1;
        definitions.push(ctx.provenance.definition(
            key,
            format!("{root}/{lang}-yml"),
            code,
            ValueType::Variable,
            order,
        ));
    }
    Ok(definitions)
}
