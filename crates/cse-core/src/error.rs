use std::error::Error;
use std::fmt;

use crate::edit::ValueKind;

pub type Result<T> = std::result::Result<T, EditError>;

/// Every failure the core can report. Nothing here is fatal to a held save:
/// callers get the error back and the previous state stays in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Buffer is not a readable zip, or the gamestate entry can't be decoded.
    ArchiveFormat { message: String },
    /// No entry named `gamestate` in the archive.
    EntryNotFound { entry: String },
    /// A `{` opened at `offset` (1-based `line`) never closed before end of input.
    UnterminatedBlock { offset: usize, line: usize },
    /// `prefix` is the path up to and including the first segment with no match.
    PathNotFound { prefix: String },
    NotAScalar { path: String },
    TypeCoercion {
        path: String,
        expected: ValueKind,
        literal: String,
    },
    InvalidPath { input: String },
    NoState,
}

impl EditError {
    pub fn archive(message: impl Into<String>) -> Self {
        Self::ArchiveFormat {
            message: message.into(),
        }
    }

    pub(crate) fn unterminated(text: &str, offset: usize) -> Self {
        let line = text.as_bytes()[..offset.min(text.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        Self::UnterminatedBlock { offset, line }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::ArchiveFormat { message } => write!(f, "invalid save archive: {message}"),
            EditError::EntryNotFound { entry } => {
                write!(f, "invalid save archive: {entry} entry not found")
            }
            EditError::UnterminatedBlock { offset, line } => write!(
                f,
                "unterminated block: '{{' at byte {offset} (line {line}) is never closed"
            ),
            EditError::PathNotFound { prefix } => write!(f, "path not found: {prefix}"),
            EditError::NotAScalar { path } => {
                write!(f, "{path} is a block, not a scalar value")
            }
            EditError::TypeCoercion {
                path,
                expected,
                literal,
            } => write!(f, "{path}: {literal:?} is not a valid {expected} value"),
            EditError::InvalidPath { input } => write!(f, "invalid field path: {input:?}"),
            EditError::NoState => write!(f, "no save file loaded"),
        }
    }
}

impl Error for EditError {}

impl From<zip::result::ZipError> for EditError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::archive(e.to_string())
    }
}
