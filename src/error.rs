use std::fmt;
use std::io;

use crate::value::ConversionError;

/// Result type used across the column reader.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the column reader.
///
/// Everything except [`Error::Io`] is latched by
/// [`ColumnReader`](crate::ColumnReader) instead of being returned from
/// `advance`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure while opening the input.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The tokenizer rejected the input (unequal record lengths, invalid
    /// UTF-8, read failure).
    #[error("malformed input: {0}")]
    Source(#[from] csv::Error),

    /// A record did not carry the field count required by the dialect.
    #[error("record {record} has {found} fields, expected {expected}")]
    FieldCount {
        record: u64,
        expected: usize,
        found: usize,
    },

    /// A bound column's text could not be converted into its declared type.
    #[error("column '{column}' on {section}: {source}")]
    Conversion {
        column: String,
        section: Section,
        #[source]
        source: ConversionError,
    },

    /// A resolved column points past the end of a short record.
    #[error("column '{column}' at position {index} is missing from {section} ({len} fields)")]
    MissingField {
        column: String,
        index: usize,
        section: Section,
        len: usize,
    },
}

impl Error {
    /// Returns the conversion failure when this error came from a scanner.
    #[must_use]
    pub const fn conversion(&self) -> Option<&ConversionError> {
        match self {
            Self::Conversion { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Part of the input an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    /// Zero-based data row, the header excluded.
    Row { index: u64 },
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::Row { index } => write!(f, "row {index}"),
        }
    }
}
