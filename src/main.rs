//! CLI entry point for the bikeshare explorer.
//!
//! Runs the interactive session by default, or a one-shot summary for a
//! single selection.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use bikeshare_explorer::{
    browser::DEFAULT_PAGE_SIZE,
    config::Config,
    filters::{City, DayFilter, MonthFilter, Selection},
    loader::load_data,
    output::{print_all_stats, print_json},
    session::Session,
    stats::Report,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_explorer")]
#[command(about = "Explore US bikeshare trip data from the terminal", long_about = None)]
struct Cli {
    /// Directory holding chicago.csv, new_york_city.csv and washington.csv
    /// (defaults to $BIKESHARE_DATA_DIR, then the working directory)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Rows shown per page of raw data
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: pick filters, read the statistics, browse raw rows
    Explore,
    /// Print the statistics for one selection and exit
    Summary {
        /// chicago, "new york city" or washington
        #[arg(short, long)]
        city: City,

        /// january through june, or all
        #[arg(long, default_value = "all")]
        month: MonthFilter,

        /// monday through sunday, or all
        #[arg(long, default_value = "all")]
        day: DayFilter,

        /// Emit a single JSON report instead of text sections
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: stderr (quiet by default, prompts share the terminal) + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_explorer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env(cli.data_dir, cli.page_size)?;
    info!(data_dir = %config.data_dir.display(), page_size = config.page_size, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Explore) {
        Commands::Explore => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            Session::new(config, stdin.lock(), stdout.lock()).run()?;
        }
        Commands::Summary {
            city,
            month,
            day,
            json,
        } => {
            summary(&config, Selection::new(city, month, day), json)?;
        }
    }

    Ok(())
}

/// Loads one selection and prints its report to stdout.
#[tracing::instrument(skip(config), fields(selection = %selection))]
fn summary(config: &Config, selection: Selection, json: bool) -> Result<()> {
    let dataset = load_data(&config.data_dir, &selection)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        print_json(&mut out, &Report::build(&dataset, &selection))?;
    } else {
        print_all_stats(&mut out, &dataset)?;
    }
    out.flush()?;

    Ok(())
}
