//! Reads a declared subset of named columns from CSV-style input into typed
//! slots that are re-populated on every row.
//!
//! ```
//! use csvcolumn::ColumnReader;
//!
//! let input = "Index,Age,Name\n1,52,Alice\n5,42,Bob\n";
//! let mut reader = ColumnReader::from_reader(input.as_bytes());
//! let name = reader.text("Name");
//! let age = reader.int("Age");
//!
//! let mut seen = Vec::new();
//! while reader.advance() && reader.error().is_none() {
//!     seen.push((name.value(), age.value()));
//! }
//! assert_eq!(seen, [("Alice".to_owned(), 52), ("Bob".to_owned(), 42)]);
//! ```
pub mod cell;
pub mod error;
pub mod logger;
pub mod reader;
pub mod value;
pub use crate::error::{Error, Result, Section};
pub use cell::Slot;
pub use reader::{
    ColumnReader, DelimitedSource, FieldCount, Position, ReadOptions, ReaderState, RecordSource,
};
pub use value::{ConversionError, Float, Int, Parsed, Scan, Text};
