mod binding;
mod options;
mod source;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use tracing::{debug, trace};

use crate::cell::Slot;
use crate::error::{Error, Result, Section};
use crate::value::{Float, Int, Parsed, Scan, Text};

use binding::BindingTable;

pub use binding::Position;
pub use options::{FieldCount, ReadOptions};
pub use source::{DelimitedSource, RecordSource};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Lifecycle of a [`ColumnReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Nothing has been read; columns may still be bound.
    Fresh,
    /// The header is read and every column is resolved.
    HeaderResolved,
    /// At least one data row has been read.
    Iterating,
    /// End of input. Terminal.
    Exhausted,
    /// The source failed. Terminal.
    Failed,
}

impl ReaderState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed)
    }
}

/// Projects named columns of delimited input into typed slots.
///
/// Bind every column first, then call [`advance`](Self::advance) until it
/// returns `false`. After each advance, check [`error`](Self::error) before
/// trusting slot contents: a conversion failure is latched but the row is
/// still reported as read, and later rows are still consumed.
pub struct ColumnReader<S> {
    source: S,
    case_sensitive_header: bool,
    columns: BindingTable,
    header: Option<Vec<String>>,
    record: StringRecord,
    state: ReaderState,
    error: Option<Error>,
    rows: u64,
}

impl ColumnReader<DelimitedSource<File>> {
    /// Opens a delimited file from disk with the default dialect.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &ReadOptions::new())
    }

    /// Opens a delimited file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader_with_options(file, options))
    }
}

impl<R: Read> ColumnReader<DelimitedSource<R>> {
    pub fn from_reader(input: R) -> Self {
        Self::from_reader_with_options(input, &ReadOptions::new())
    }

    pub fn from_reader_with_options(input: R, options: &ReadOptions) -> Self {
        Self::new(DelimitedSource::new(input, options))
            .with_case_sensitive_header(options.case_sensitive_header())
    }
}

impl<S: RecordSource> ColumnReader<S> {
    /// Wraps a record source. The first record it yields is the header.
    pub fn new(source: S) -> Self {
        Self {
            source,
            case_sensitive_header: false,
            columns: BindingTable::default(),
            header: None,
            record: StringRecord::new(),
            state: ReaderState::Fresh,
            error: None,
            rows: 0,
        }
    }

    /// Header names must match declared names exactly when `true`. Only
    /// consulted when the header is resolved.
    #[must_use]
    pub const fn with_case_sensitive_header(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_header = case_sensitive;
        self
    }

    /// Declares a column scanned into `value` on every row.
    ///
    /// # Panics
    ///
    /// Panics if called after the first [`advance`](Self::advance).
    pub fn bind<V: Scan + 'static>(&mut self, name: impl Into<String>, value: V) -> Slot<V> {
        let name = name.into();
        assert!(
            self.state == ReaderState::Fresh,
            "column '{name}' bound after iteration started; bind every column before the first advance"
        );
        let slot = Slot::new(value);
        self.columns.bind(name, Box::new(slot.clone()));
        slot
    }

    pub fn text(&mut self, name: impl Into<String>) -> Slot<Text> {
        self.bind(name, Text::default())
    }

    pub fn int(&mut self, name: impl Into<String>) -> Slot<Int> {
        self.bind(name, Int::default())
    }

    /// Integer column whose [`Slot::value_or_default`] falls back to
    /// `default` on rows that fail to convert.
    pub fn int_or(&mut self, name: impl Into<String>, default: i64) -> Slot<Int> {
        self.bind(name, Int::with_default(default))
    }

    pub fn float(&mut self, name: impl Into<String>) -> Slot<Float> {
        self.bind(name, Float::default())
    }

    pub fn float_or(&mut self, name: impl Into<String>, default: f64) -> Slot<Float> {
        self.bind(name, Float::with_default(default))
    }

    pub fn parsed<T>(&mut self, name: impl Into<String>) -> Slot<Parsed<T>>
    where
        T: FromStr + 'static,
        T::Err: std::fmt::Display,
    {
        self.bind(name, Parsed::default())
    }

    /// Reads the next row into every bound slot.
    ///
    /// The first call consumes the header. Returns `false` at end of input,
    /// on a source failure, and on every call after either. A conversion
    /// failure latches an error but still returns `true`; the remaining
    /// columns of that row are scanned regardless.
    pub fn advance(&mut self) -> bool {
        match self.state {
            ReaderState::Fresh => {
                self.columns.seal();
                if !self.read_header() {
                    return false;
                }
            }
            ReaderState::Exhausted | ReaderState::Failed => return false,
            ReaderState::HeaderResolved | ReaderState::Iterating => {}
        }

        match self.source.read_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => {
                debug!(rows = self.rows, "input exhausted");
                self.state = ReaderState::Exhausted;
                return false;
            }
            Err(err) => {
                self.latch(err);
                self.state = ReaderState::Failed;
                return false;
            }
        }

        let section = Section::Row { index: self.rows };
        self.rows += 1;
        self.state = ReaderState::Iterating;

        let mut first_error = None;
        for column in self.columns.iter_mut() {
            let Position::Resolved(index) = column.position else {
                continue;
            };
            let outcome = match self.record.get(index) {
                Some(text) => column
                    .scanner
                    .scan(text)
                    .map_err(|source| Error::Conversion {
                        column: column.name.clone(),
                        section,
                        source,
                    }),
                None => Err(Error::MissingField {
                    column: column.name.clone(),
                    index,
                    section,
                    len: self.record.len(),
                }),
            };
            if let Err(err) = outcome {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    trace!(error = %err, "discarding secondary row error");
                }
            }
        }
        if let Some(err) = first_error {
            self.latch(err);
        }
        true
    }

    fn read_header(&mut self) -> bool {
        match self.source.read_record(&mut self.record) {
            Ok(true) => {
                let mut header: Vec<String> = self.record.iter().map(str::to_owned).collect();
                if let Some(first) = header.first_mut()
                    && let Some(stripped) = first.strip_prefix(BYTE_ORDER_MARK)
                {
                    *first = stripped.to_owned();
                }
                self.columns.resolve(&header, self.case_sensitive_header);
                debug!(fields = header.len(), "header resolved");
                self.header = Some(header);
                self.state = ReaderState::HeaderResolved;
                true
            }
            Ok(false) => {
                debug!("input ended before a header");
                self.state = ReaderState::Exhausted;
                false
            }
            Err(err) => {
                self.latch(err);
                self.state = ReaderState::Failed;
                false
            }
        }
    }

    fn latch(&mut self, err: Error) {
        if self.error.is_some() {
            trace!(error = %err, "error already latched; discarding");
            return;
        }
        debug!(error = %err, "latching error");
        self.error = Some(err);
    }

    /// First error seen during the reader's lifetime. Never cleared.
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub const fn state(&self) -> ReaderState {
        self.state
    }

    /// Header names, available once the first advance read them.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Position of the first column declared under `name`.
    pub fn position(&self, name: &str) -> Option<Position> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.position)
    }

    /// Declared names and positions, in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, Position)> {
        self.columns
            .iter()
            .map(|column| (column.name.as_str(), column.position))
    }

    /// For each declared column, in declaration order, whether the current
    /// row supplied its field. Absent columns and fields missing from a short
    /// record report `false`, as does every column outside of a read row.
    pub fn row_coverage(&self) -> impl Iterator<Item = bool> {
        let len = if self.state == ReaderState::Iterating {
            self.record.len()
        } else {
            0
        };
        self.columns
            .iter()
            .map(move |column| column.position.index().is_some_and(|index| index < len))
    }

    /// Data rows read so far, the header excluded.
    pub const fn rows_read(&self) -> u64 {
        self.rows
    }

    /// Consumes the reader and reports the row count or the latched error.
    ///
    /// # Errors
    ///
    /// Returns the latched error, if any.
    pub fn finish(self) -> Result<u64> {
        self.error.map_or(Ok(self.rows), Err)
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
