//! Error types for BCMH to RomanText conversion
//!
//! Every error is fatal for the batch: nothing here is retried or skipped.
//! Parse errors carry the 1-based line number of the preprocessed text.

use std::path::PathBuf;

use thiserror::Error;

use crate::score::Offset;

/// Top-level conversion error type
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Reading an input or writing an output failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The score text could not be read as Humdrum **kern
    #[error("Humdrum parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// An annotated offset has no note or rest to take measure and beat from
    #[error("no note or rest at annotated offset {offset}")]
    NoNoteAtOffset { offset: Offset },

    /// The RomanText header template failed to compile or render
    #[error("header template error: {0}")]
    Template(#[from] mustache::Error),

    /// The configuration file could not be read
    #[error("invalid configuration {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConversionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConversionError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fatal Humdrum parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A data or interpretation record appeared before any `**` spine declaration
    #[error("line {line}: record before any exclusive interpretation")]
    MissingExclusiveInterpretation { line: usize },

    /// Record has a different number of tokens than there are active spines
    #[error("line {line}: expected {expected} spines, found {found}")]
    SpineCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A **kern token whose rhythm cannot be read
    #[error("line {line}: invalid duration in token {token:?}")]
    InvalidDuration { line: usize, token: String },

    /// A spine manipulator this reader does not handle
    #[error("line {line}: unsupported spine manipulator {token:?}")]
    UnsupportedManipulator { line: usize, token: String },
}

pub type Result<T> = std::result::Result<T, ConversionError>;
