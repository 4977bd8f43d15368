use crate::aggregate::{aggregate_minutes, AggregateError};
use crate::config::types::ParseErrorStrategy;
use crate::events::normalize;
use crate::source::reader::{EventReader, ReaderError};
use crate::window::{moving_average, AverageRecord, WindowError, WindowSize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("{0}")]
    Aggregate(#[from] AggregateError),

    #[error("window error: {0}")]
    Window(#[from] WindowError),
}

/// Output series plus counters from each stage.
#[derive(Debug, Clone)]
pub struct SeriesReport {
    pub records: Vec<AverageRecord>,
    pub lines_read: u64,
    pub dropped_lines: u64,
    pub decoded_records: usize,
    pub delivery_events: usize,
    pub minutes: usize,
}

/// Read `input` and compute its dense moving-average series.
///
/// The file handle is released before the series is computed.
pub fn compute_series(
    input: &Path,
    window_size: WindowSize,
    parse_error_strategy: ParseErrorStrategy,
) -> Result<SeriesReport, PipelineError> {
    let (raw_records, lines_read, dropped_lines) = {
        let mut reader = EventReader::open(input, parse_error_strategy)?;
        let records = reader.read_all()?;
        (records, reader.lines_read(), reader.dropped_lines())
    };
    info!(
        path = %input.display(),
        lines = lines_read,
        records = raw_records.len(),
        dropped = dropped_lines,
        "Read input"
    );

    let samples = normalize(&raw_records);
    let minutes = aggregate_minutes(&samples)?;
    info!(
        events = samples.len(),
        minutes = minutes.len(),
        "Aggregated delivery events"
    );

    let records = moving_average(&minutes, window_size)?;

    Ok(SeriesReport {
        records,
        lines_read,
        dropped_lines,
        decoded_records: raw_records.len(),
        delivery_events: samples.len(),
        minutes: minutes.len(),
    })
}
