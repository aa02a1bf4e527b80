//! Error types for lexicon compilation, refishing and transducer comparison.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using CognateError.
pub type Result<T> = std::result::Result<T, CognateError>;

/// Errors that can occur while building or transforming boards.
#[derive(Error, Debug)]
pub enum CognateError {
    /// Failed to read a file.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed lexicon file.
    #[error("Failed to parse lexicon: {0}")]
    Lexicon(#[from] csv::Error),

    /// A column an operation depends on is absent from the lexicon header.
    #[error("lexicon is missing the {column} column")]
    MissingColumn { column: String },

    /// A syllable id that is not of the form `word-<ID>-<n>`.
    #[error("malformed syllable id '{0}'")]
    MalformedSyllableId(String),

    /// A syllable id that points outside the known words.
    #[error("syllable '{0}' does not match any word in the lexicon")]
    UnknownSyllable(String),

    /// Structure and token strings of different length.
    #[error("structure '{schema}' does not line up with tokens '{tokens}'")]
    PhonemeMismatch { schema: String, tokens: String },

    /// A maximal schema slot without a merging rule.
    #[error("no merging rule for structure slot '{0}'")]
    UnknownSlot(String),

    /// foma or flookup could not be started.
    #[error("Failed to run {command}: {source}")]
    ToolLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// foma or flookup exited unsuccessfully.
    #[error("Failed to run transducer tool ({command} exited with {status}): {stderr}")]
    ToolFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// flookup answered for fewer or more words than it was given.
    #[error("Failed to look up {expected} word(s) with {command}: got {answered} answer(s)")]
    LookupCount {
        command: String,
        expected: usize,
        answered: usize,
    },

    /// JSON (de)serialization error.
    #[error("invalid board document: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CognateError {
    /// Create a FileRead error.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a MissingColumn error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Whether the error comes from the environment rather than from the input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. }
                | Self::ToolLaunch { .. }
                | Self::ToolFailed { .. }
                | Self::LookupCount { .. }
                | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message() {
        let err = CognateError::missing_column("CROSSIDS");
        assert_eq!(err.to_string(), "lexicon is missing the CROSSIDS column");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_file_read_is_internal() {
        let err = CognateError::file_read(
            "lexicon.tsv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_internal());
        assert!(err.to_string().starts_with("Failed to read 'lexicon.tsv'"));
    }
}
