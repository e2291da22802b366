#![allow(dead_code)]
use std::collections::VecDeque;
use std::io;

use csv::StringRecord;
use csvcolumn::{RecordSource, Result};

/// In-memory record source that can inject failures at chosen positions.
pub struct ScriptedSource {
    records: VecDeque<Result<Vec<String>>>,
    pub reads: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
            reads: 0,
        }
    }

    pub fn record(mut self, fields: &[&str]) -> Self {
        self.records
            .push_back(Ok(fields.iter().map(|field| (*field).to_owned()).collect()));
        self
    }

    pub fn failure(mut self, message: &str) -> Self {
        let err = csv::Error::from(io::Error::other(message.to_owned()));
        self.records.push_back(Err(err.into()));
        self
    }
}

impl RecordSource for ScriptedSource {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        self.reads += 1;
        match self.records.pop_front() {
            None => Ok(false),
            Some(Err(err)) => Err(err),
            Some(Ok(fields)) => {
                record.clear();
                for field in &fields {
                    record.push_field(field);
                }
                Ok(true)
            }
        }
    }
}
