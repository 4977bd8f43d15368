use clap::{Parser, Subcommand};
use maverage::cli::run::RunArgs;
use maverage::config::types::ParseErrorStrategy;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "maverage")]
#[command(about = "Per-minute moving average of translation delivery times", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        /// JSON-lines file with the events
        #[arg(long, alias = "input_file")]
        input_file: PathBuf,

        /// Size (in minutes) of the sliding window
        #[arg(long, alias = "window_size", allow_negative_numbers = true)]
        window_size: i64,

        /// Where to write the series (defaults to output.path from config)
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum)]
        on_parse_error: Option<ParseErrorStrategy>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

fn main() {
    // Logs go to stderr so `config init --stdout` output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maverage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Run {
            input_file,
            window_size,
            output,
            on_parse_error,
        } => maverage::cli::run::run(RunArgs {
            config: cli.config,
            input_file,
            window_size,
            output,
            on_parse_error,
        })
        .map_err(Into::into),
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => maverage::cli::config::init(stdout, cli.config.as_deref()),
            ConfigAction::Validate => maverage::cli::config::validate(
                maverage::config::resolve_config_path(cli.config.as_deref()),
            ),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
