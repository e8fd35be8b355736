//! hivectl — command-line front end for hivescale.
//!
//! # Usage
//!
//! ```text
//! hivectl score task.json
//! hivectl --config hive.toml scale a.json b.json --prometheus
//! hivectl --config hive.toml status
//! hivectl config init hive.toml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "hivectl",
    about = "hivescale — complexity-driven agent auto-scaling",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to hive.toml (default: ./hive.toml if present, else built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a task file and show the complexity breakdown
    Score {
        /// JSON file holding one task or an array of tasks
        task: PathBuf,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Run task files through one coordinator and report each decision.
    ///
    /// Decisions are written to the store configured in [store]; use the
    /// redb backend to inspect them later with `hivectl status`.
    Scale {
        /// JSON task files, processed in order
        #[arg(required = true)]
        tasks: Vec<PathBuf>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Print the Prometheus exposition after the last task
        #[arg(long)]
        prometheus: bool,
    },
    /// Show the persisted status and scaling decisions
    Status {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Manage hive.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented default hive.toml
    Init {
        #[arg(default_value = "hive.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Score { task, format } => {
            commands::score::score(cli.config.as_deref(), &task, &format)
        }
        Commands::Scale {
            tasks,
            format,
            prometheus,
        } => commands::scale::scale(cli.config.as_deref(), &tasks, &format, prometheus),
        Commands::Status { format } => commands::status::status(cli.config.as_deref(), &format),
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => commands::config::init(&path, force),
        },
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,hivescale=debug"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}
