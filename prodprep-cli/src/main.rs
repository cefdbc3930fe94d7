//! prodprep CLI: turns a labeled CSV into model-ready artifacts.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use prodprep_core::{CategoricalPolicy, ScalingPolicy, SplitPercentages};

/// prodprep: data preparation for worker productivity models
#[derive(Parser, Debug)]
#[command(name = "prodprep", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (searched for prodprep.toml)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Configuration file path (replaces the workspace prodprep.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write JSON logs to the daily log file
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Clean, encode, split and scale a labeled CSV file
    Run(RunArgs),
    /// Encode and scale new data with the artifacts of a previous run
    Apply {
        /// Input CSV file
        input: PathBuf,
        /// Artifact directory written by `prodprep run`
        #[arg(short, long)]
        artifacts: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Map class codes back to their labels
    Decode {
        /// Artifact directory written by `prodprep run`
        #[arg(short, long)]
        artifacts: PathBuf,
        /// Class codes to decode
        #[arg(required = true)]
        codes: Vec<usize>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Input CSV file
    input: PathBuf,

    /// Output directory for the artifact set
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Random seed for the split
    #[arg(long)]
    seed: Option<u64>,

    /// Split percentages as train,validation,test (e.g. 70,15,15)
    #[arg(long)]
    split: Option<SplitPercentages>,

    /// Feature scaling: standard, min_max or none
    #[arg(long)]
    scaling: Option<ScalingPolicy>,

    /// Categorical feature encoding: one_hot or ordinal
    #[arg(long)]
    encoding: Option<CategoricalPolicy>,

    /// Name of the label column
    #[arg(short, long)]
    label: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default prodprep.toml into the workspace
    Init,
    /// Print the effective configuration
    Show,
}

fn init_tracing(
    verbose: u8,
    quiet: bool,
    log_json: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer, opt-in
    let mut guard = None;
    let json_layer = if log_json {
        let log_dir = directories::ProjectDirs::from("dev", "prodprep", "prodprep")
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("."));
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "prodprep.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug")),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(commands::parse_exit_code(&e));
        }
    };
    let _guard = init_tracing(cli.verbose, cli.quiet, cli.log_json);

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| cli.workspace.clone());

    match commands::handle_command(cli.command, &workspace, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(commands::exit_code(&e))
        }
    }
}
