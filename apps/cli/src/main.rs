//! Trainlab CLI - drive the experiment lifecycle from a terminal.
//!
//! Every command prints JSON on stdout; logs go to stderr.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trainlab_core::{Algorithm, ParamValue, ProblemType, WorkbenchConfig};

/// Trainlab - configure, train and query simulated models
#[derive(Parser, Debug)]
#[command(name = "trainlab", author, version, about)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List algorithms and their hyperparameters
    Catalog {
        /// Only algorithms for this problem type
        #[arg(long)]
        problem_type: Option<ProblemType>,
    },

    /// List stored datasets (the sample dataset unless disabled in config)
    Datasets,

    /// Parse a CSV file and show the resulting dataset
    Ingest {
        /// Path to a .csv file
        file: PathBuf,
    },

    /// Configure a model, train it, then predict and evaluate
    Run {
        /// Algorithm id, e.g. random_forest
        #[arg(short, long)]
        algorithm: Algorithm,

        /// Problem type; defaults to the algorithm's
        #[arg(long)]
        problem_type: Option<ProblemType>,

        /// Hyperparameter override, repeatable
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,

        /// Train on this CSV file instead of the sample dataset
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Stop the simulation early after this many milliseconds
        #[arg(long, value_name = "MS")]
        stop_after_ms: Option<u64>,
    },
}

fn parse_param(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in `{raw}`"));
    }
    Ok((key.to_string(), ParamValue::parse_literal(value)))
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = WorkbenchConfig::load(args.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match args.command {
        Command::Catalog { problem_type } => commands::catalog::execute(problem_type),
        Command::Datasets => commands::datasets::execute(config).await,
        Command::Ingest { file } => commands::ingest::execute(config, &file).await,
        Command::Run { algorithm, problem_type, params, dataset, stop_after_ms } => {
            commands::run::execute(
                config,
                commands::run::RunOptions {
                    algorithm,
                    problem_type,
                    params: params.into_iter().collect(),
                    dataset,
                    stop_after_ms,
                },
            )
            .await
        }
    }
}
