//! Error types for script parsing and descriptor handling.
//!
//! Parse errors never escape the parser registry: a file that fails to parse
//! becomes a single [`ValueType::Invalid`](crate::ValueType::Invalid) definition
//! carrying the error location.

use crate::scanner::{AnomalyKind, BraceAnomaly};
use thiserror::Error;

/// Errors raised while turning script text into definitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `}` appeared with no open block.
    #[error("Unexpected closing brace at line {line}, column {column}")]
    UnexpectedClosingBrace { line: usize, column: usize },

    /// End of input was reached with a block still open.
    #[error("Unterminated block opened at line {line}, column {column}")]
    UnterminatedBlock { line: usize, column: usize },

    /// Any other malformed construct.
    #[error("{message} (line {line}, column {column})")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedClosingBrace { line, .. }
            | ParseError::UnterminatedBlock { line, .. }
            | ParseError::Syntax { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::UnexpectedClosingBrace { column, .. }
            | ParseError::UnterminatedBlock { column, .. }
            | ParseError::Syntax { column, .. } => *column,
        }
    }
}

impl From<BraceAnomaly> for ParseError {
    fn from(anomaly: BraceAnomaly) -> Self {
        match anomaly.kind {
            AnomalyKind::UnexpectedClose => ParseError::UnexpectedClosingBrace {
                line: anomaly.line,
                column: anomaly.column,
            },
            AnomalyKind::Unclosed => ParseError::UnterminatedBlock {
                line: anomaly.line,
                column: anomaly.column,
            },
        }
    }
}

/// Errors raised while reading or writing mod descriptors.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Failed to parse or serialize JSON metadata.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The descriptor has no `name`.
    #[error("Descriptor is missing a mod name")]
    MissingName,
}
