use std::io::Read;

use csv::{Reader, StringRecord};

use crate::error::{Error, Result};

use super::options::{FieldCount, ReadOptions};

/// Yields one tokenized record per call.
pub trait RecordSource {
    /// Reads the next record into `record`.
    ///
    /// Returns `Ok(false)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be tokenized.
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool>;
}

/// A bare tokenizer. It must be built without header handling, otherwise
/// the first record never reaches the column reader.
impl<R: Read> RecordSource for Reader<R> {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        Ok(Self::read_record(self, record)?)
    }
}

/// Tokenizer plus the dialect rules `csv` does not enforce itself.
pub struct DelimitedSource<R> {
    reader: Reader<R>,
    fields_per_record: FieldCount,
    trim_leading_space: bool,
    untrimmed: StringRecord,
    records: u64,
}

impl<R: Read> DelimitedSource<R> {
    pub fn new(input: R, options: &ReadOptions) -> Self {
        Self {
            reader: options.csv_builder().from_reader(input),
            fields_per_record: options.fields_per_record(),
            trim_leading_space: options.trim_leading_space(),
            untrimmed: StringRecord::new(),
            records: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R: Read> RecordSource for DelimitedSource<R> {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        let target = if self.trim_leading_space {
            &mut self.untrimmed
        } else {
            &mut *record
        };
        if !self.reader.read_record(target)? {
            return Ok(false);
        }
        self.records += 1;
        if self.trim_leading_space {
            record.clear();
            for field in &self.untrimmed {
                record.push_field(field.trim_start());
            }
        }
        if let FieldCount::Exact(expected) = self.fields_per_record
            && record.len() != expected
        {
            return Err(Error::FieldCount {
                record: self.records,
                expected,
                found: record.len(),
            });
        }
        Ok(true)
    }
}
