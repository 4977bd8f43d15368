use crate::window::AverageRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write one JSON object per line, truncating any existing file.
/// Returns the number of records written.
pub fn write_records(path: &Path, records: &[AverageRecord]) -> Result<usize, WriterError> {
    let file = File::create(path).map_err(|source| WriterError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    write_lines(&mut out, records)?;
    out.flush()?;

    Ok(records.len())
}

pub fn write_lines<W: Write>(out: &mut W, records: &[AverageRecord]) -> Result<(), WriterError> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
