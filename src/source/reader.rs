use crate::config::types::ParseErrorStrategy;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// One decoded input line. No fixed schema.
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record on line {line_number}: {reason}")]
    Malformed { line_number: u64, reason: String },
}

/// Reads a JSON-lines event log one record at a time.
pub struct EventReader {
    file: BufReader<File>,
    parse_error_strategy: ParseErrorStrategy,
    line_number: u64,
    dropped_lines: u64,
}

impl EventReader {
    /// Open the file for reading from the beginning.
    pub fn open(path: &Path, parse_error_strategy: ParseErrorStrategy) -> Result<Self, ReaderError> {
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file: BufReader::new(file),
            parse_error_strategy,
            line_number: 0,
            dropped_lines: 0,
        })
    }

    /// Read the next record, skipping blank lines.
    ///
    /// Lines that are not a UTF-8 JSON object are dropped or returned as
    /// `ReaderError::Malformed`, depending on the parse error strategy.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>, ReaderError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let bytes_read = self.file.read_until(b'\n', &mut buf)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let reason = match std::str::from_utf8(&buf).map(str::trim) {
                Ok("") => continue,
                Ok(line) => match serde_json::from_str::<Value>(line) {
                    Ok(Value::Object(record)) => return Ok(Some(record)),
                    Ok(other) => format!("expected a JSON object, found {}", json_kind(&other)),
                    Err(e) => e.to_string(),
                },
                Err(e) => format!("invalid UTF-8: {}", e),
            };

            match self.parse_error_strategy {
                ParseErrorStrategy::Drop => {
                    debug!(line_number = self.line_number, %reason, "Dropping malformed line");
                    self.dropped_lines += 1;
                }
                ParseErrorStrategy::Fail => {
                    return Err(ReaderError::Malformed {
                        line_number: self.line_number,
                        reason,
                    });
                }
            }
        }
    }

    /// Drain the rest of the file.
    pub fn read_all(&mut self) -> Result<Vec<RawRecord>, ReaderError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Number of lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    pub fn dropped_lines(&self) -> u64 {
        self.dropped_lines
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
