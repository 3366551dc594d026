//! Parser registry: turns one mod file into definitions.
//!
//! Parsers are tried in order: game-specific ones first, then the generic
//! ones, then the object fallback. The first parser whose `can_parse` accepts
//! the file wins. A parse failure never propagates; the file becomes a single
//! [`ValueType::Invalid`] definition instead.

mod defines;
mod localization;
mod object;
mod whole_text;

use crate::definition::{content_fingerprint, Definition, DefinitionError, Provenance, ValueType};
use crate::error::ParseError;
use crate::game::GameType;
use crate::paths::{format_type, is_text_file, normalize_path, path_ci};
use crate::scanner::{split_lines, CommentStyle};
use camino::{Utf8Path, Utf8PathBuf};

pub use object::GENERIC_KEY_IDS;

/// A file read from a mod, relative to the mod root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModFile {
    pub path: Utf8PathBuf,
    pub full_path: Option<Utf8PathBuf>,
    pub bytes: Vec<u8>,
}

impl ModFile {
    pub fn new(path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            full_path: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_full_path(mut self, full_path: Utf8PathBuf) -> Self {
        self.full_path = Some(full_path);
        self
    }
}

/// Everything a parser sees about one file.
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    pub provenance: Provenance<'a>,
    /// Decoded lines; empty for binary files.
    pub lines: Vec<String>,
    pub content_hash: u64,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        mod_name: &'a str,
        dependencies: &'a [String],
        file: &'a ModFile,
    ) -> Self {
        let lines = if is_text_file(&file.path) {
            split_lines(&String::from_utf8_lossy(&file.bytes))
        } else {
            Vec::new()
        };
        Self {
            provenance: Provenance {
                file: &file.path,
                full_path: file.full_path.as_deref(),
                mod_name,
                dependencies,
            },
            lines,
            content_hash: content_fingerprint(&file.bytes),
        }
    }

    pub fn file(&self) -> &'a Utf8Path {
        self.provenance.file
    }

    pub fn file_ci(&self) -> String {
        path_ci(self.provenance.file)
    }

    pub fn is_text(&self) -> bool {
        is_text_file(self.provenance.file)
    }

    pub fn comment_style(&self) -> CommentStyle {
        CommentStyle::for_file(self.provenance.file)
    }

    pub fn default_type(&self) -> String {
        format_type(self.provenance.file, None)
    }
}

/// Case-insensitive file predicate on a mod-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileMatch {
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    /// Parent directory equals the given folder exactly.
    InDirectory(String),
}

impl FileMatch {
    pub fn matches(&self, file_ci: &str) -> bool {
        match self {
            FileMatch::Equals(p) => file_ci == p.to_lowercase(),
            FileMatch::StartsWith(p) => file_ci.starts_with(&p.to_lowercase()),
            FileMatch::EndsWith(p) => file_ci.ends_with(&p.to_lowercase()),
            FileMatch::InDirectory(p) => {
                let parent = file_ci.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
                parent == p.to_lowercase()
            }
        }
    }
}

fn any_match(matches: &[FileMatch], file_ci: &str) -> bool {
    matches.iter().any(|m| m.matches(file_ci))
}

/// The parsing strategy of a [`Parser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserKind {
    /// Whole file as one definition, id = file name.
    WholeText { matches: Vec<FileMatch> },
    /// Any non-text file, compared by content hash.
    Binary,
    /// One variable definition per entry of a defines block.
    Defines { matches: Vec<FileMatch> },
    /// `l_<lang>:` yaml files, one variable per `key:0 "text"` line.
    Localization,
    /// Objects identified by an inner key such as `id = ...`.
    ///
    /// With no file matches, files are selected by scanning for the keys.
    Key {
        matches: Vec<FileMatch>,
        key_ids: Vec<String>,
    },
    /// Top-level `key = value` and `key = { ... }`; accepts any text file.
    Object,
}

/// A named parsing strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parser {
    pub name: &'static str,
    pub kind: ParserKind,
}

impl Parser {
    pub fn new(name: &'static str, kind: ParserKind) -> Self {
        Self { name, kind }
    }

    pub fn can_parse(&self, ctx: &ParseContext<'_>) -> bool {
        let file_ci = ctx.file_ci();
        match &self.kind {
            ParserKind::Binary => !ctx.is_text(),
            _ if !ctx.is_text() => false,
            ParserKind::WholeText { matches } | ParserKind::Defines { matches } => {
                any_match(matches, &file_ci)
            }
            ParserKind::Localization => localization::can_parse(&file_ci),
            ParserKind::Key { matches, key_ids } if matches.is_empty() => {
                object::has_leading_key(ctx, key_ids)
            }
            ParserKind::Key { matches, .. } => any_match(matches, &file_ci),
            ParserKind::Object => true,
        }
    }

    pub fn parse(&self, ctx: &ParseContext<'_>) -> Result<Vec<Definition>, ParseError> {
        match &self.kind {
            ParserKind::WholeText { .. } => Ok(whole_text::parse_whole_text(ctx)),
            ParserKind::Binary => Ok(whole_text::parse_binary(ctx)),
            ParserKind::Defines { .. } => defines::parse(ctx),
            ParserKind::Localization => localization::parse(ctx),
            ParserKind::Key { key_ids, .. } => object::parse(ctx, key_ids),
            ParserKind::Object => object::parse(ctx, &[]),
        }
    }
}

/// Parsers that apply to every game, in priority order.
pub fn generic_parsers() -> Vec<Parser> {
    vec![
        Parser::new("Binary", ParserKind::Binary),
        Parser::new(
            "Defines",
            ParserKind::Defines {
                matches: vec![FileMatch::StartsWith("common/defines".into())],
            },
        ),
        Parser::new(
            "WholeText",
            ParserKind::WholeText {
                matches: vec![
                    FileMatch::EndsWith(".shader".into()),
                    FileMatch::EndsWith(".fxh".into()),
                    FileMatch::StartsWith("common/on_actions".into()),
                    FileMatch::StartsWith("sound".into()),
                ],
            },
        ),
        Parser::new("Localization", ParserKind::Localization),
        Parser::new(
            "Key",
            ParserKind::Key {
                matches: Vec::new(),
                key_ids: GENERIC_KEY_IDS.iter().map(|k| k.to_string()).collect(),
            },
        ),
    ]
}

/// Ordered list of parsers for a game.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: Vec<Parser>,
}

impl ParserRegistry {
    /// A registry with exactly the given parsers, in order.
    pub fn new(parsers: Vec<Parser>) -> Self {
        Self { parsers }
    }

    /// Generic parsers plus the object fallback.
    pub fn generic() -> Self {
        let mut parsers = generic_parsers();
        parsers.push(Parser::new("Object", ParserKind::Object));
        Self { parsers }
    }

    /// Game parsers, then generic parsers, then the object fallback.
    pub fn for_game(game: &GameType) -> Self {
        let mut parsers = game.parsers.clone();
        parsers.extend(generic_parsers());
        parsers.push(Parser::new("Object", ParserKind::Object));
        Self { parsers }
    }

    pub fn parsers(&self) -> &[Parser] {
        &self.parsers
    }

    pub fn select(&self, ctx: &ParseContext<'_>) -> Option<&Parser> {
        self.parsers.iter().find(|p| p.can_parse(ctx))
    }

    /// Parse one file. Unmatched files yield nothing; failures yield one
    /// invalid definition.
    pub fn parse(&self, ctx: &ParseContext<'_>) -> Vec<Definition> {
        let Some(parser) = self.select(ctx) else {
            tracing::debug!("No parser accepts {}", ctx.file());
            return Vec::new();
        };
        tracing::trace!("Parsing {} with {}", ctx.file(), parser.name);
        match parser.parse(ctx) {
            Ok(definitions) => definitions,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {} in '{}': {}",
                    ctx.file(),
                    ctx.provenance.mod_name,
                    err
                );
                vec![invalid_definition(ctx, &err)]
            }
        }
    }

    pub fn parse_file(
        &self,
        mod_name: &str,
        dependencies: &[String],
        file: &ModFile,
    ) -> Vec<Definition> {
        let ctx = ParseContext::new(mod_name, dependencies, file);
        self.parse(&ctx)
    }

    /// Parse every file of a mod.
    pub fn parse_mod(
        &self,
        mod_name: &str,
        dependencies: &[String],
        files: &[ModFile],
    ) -> Vec<Definition> {
        files
            .iter()
            .flat_map(|file| self.parse_file(mod_name, dependencies, file))
            .collect()
    }
}

fn invalid_definition(ctx: &ParseContext<'_>, err: &ParseError) -> Definition {
    let file = ctx.file();
    let mut def = ctx.provenance.definition(
        file.file_name().unwrap_or_default(),
        ctx.default_type(),
        ctx.lines.join("\n"),
        ValueType::Invalid,
        1,
    );
    def.error = Some(DefinitionError {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    });
    def
}
