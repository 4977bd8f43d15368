use crate::config::types::ParseErrorStrategy;
use crate::output::writer::write_records;
use crate::pipeline::compute_series;
use crate::window::WindowSize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("input file '{0}' does not exist")]
    InputNotFound(PathBuf),

    #[error("{0}")]
    Window(#[from] crate::window::WindowError),

    #[error("{0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("output error: {0}")]
    Writer(#[from] crate::output::WriterError),
}

/// Arguments for one batch run. `None` fields fall back to the config file.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub input_file: PathBuf,
    pub window_size: i64,
    pub output: Option<PathBuf>,
    pub on_parse_error: Option<ParseErrorStrategy>,
}

pub fn run(args: RunArgs) -> Result<(), RunError> {
    // Rejected before any file is touched
    let window_size = WindowSize::new(args.window_size)?;

    let config = crate::config::load_or_default(args.config.as_deref())?;
    let output_path = args.output.unwrap_or(config.output.path);
    let parse_error_strategy = args.on_parse_error.unwrap_or(config.input.on_parse_error);

    if !args.input_file.is_file() {
        return Err(RunError::InputNotFound(args.input_file));
    }

    info!(
        input = %args.input_file.display(),
        window_minutes = window_size.minutes(),
        ?parse_error_strategy,
        "Computing moving average"
    );
    let report = compute_series(&args.input_file, window_size, parse_error_strategy)?;

    let written = write_records(&output_path, &report.records)?;
    info!(
        output = %output_path.display(),
        records = written,
        "Wrote average delivery times"
    );

    Ok(())
}
