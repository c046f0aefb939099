mod aggregator;
mod cli;
mod client;
mod config;
mod logging;
mod model;
mod paths;
mod render;
mod tui;
mod workflow;

use crate::aggregator::TaskForm;
use crate::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskrank", version)]
#[command(about = "Submit tasks to a prioritization service and review the ranking", long_about = None)]
struct Cli {
    /// Config file (default: search TASKRANK_CONFIG, ./taskrank.toml, config dirs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank a form task and/or a JSON array of tasks
    Analyze {
        /// Task title
        #[arg(long, default_value = "")]
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        due_date: String,

        /// Estimated hours
        #[arg(long, default_value = "")]
        hours: String,

        /// Importance
        #[arg(long, default_value = "")]
        importance: String,

        /// Comma-separated dependency titles
        #[arg(long, default_value = "")]
        deps: String,

        /// JSON array of tasks
        #[arg(long)]
        json: Option<String>,

        /// File holding a JSON array of tasks
        #[arg(long)]
        json_file: Option<PathBuf>,

        /// Ranking strategy (forwarded as-is)
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Fetch proactive suggestions
    Suggest {
        /// Suggestion strategy (forwarded as-is)
        #[arg(long)]
        strategy: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_path) = match Config::load_with_path(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) if cli.config.is_none() => {
            eprintln!("Warning: failed to load config, using defaults: {e:#}");
            (Config::default(), None)
        }
        Err(e) => return Err(e),
    };
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }
    config.validate()?;

    // The terminal UI owns the screen; keep console logging out of it.
    let will_run_tui = cli.cmd.is_none();
    let log_dir = match logging::setup_tracing_with_settings(logging::LoggingSettings {
        level: config.logging.level.as_deref(),
        directory: config.logging.directory.as_deref(),
        retention_days: config.logging.retention_days,
        suppress_stdout: will_run_tui,
    }) {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("Failed to initialize logging: {err}");
            None
        }
    };

    match config_path.as_ref() {
        Some(path) => tracing::debug!("Config File: {}", path.display()),
        None => tracing::debug!("Config File: (default)"),
    }
    if let Some(dir) = log_dir.as_ref() {
        tracing::debug!("Log Directory: {}", dir.display());
    }
    tracing::debug!("Service: {}", config.service.base_url);

    let client = client::ServiceClient::new(&config.service)?;
    let controller = workflow::Controller::new(client);

    let ok = match cli.cmd {
        Some(Command::Analyze {
            title,
            due_date,
            hours,
            importance,
            deps,
            json,
            json_file,
            strategy,
        }) => {
            let args = cli::headless::AnalyzeArgs {
                form: TaskForm {
                    title,
                    due_date,
                    estimated_hours: hours,
                    importance,
                    dependencies: deps,
                },
                json,
                json_file,
                strategy: strategy.unwrap_or_else(|| config.service.default_strategy.clone()),
            };
            cli::headless::analyze(&controller, args).await?
        }
        Some(Command::Suggest { strategy }) => {
            let strategy = strategy.unwrap_or_else(|| config.service.default_strategy.clone());
            cli::headless::suggest(&controller, &strategy).await?
        }
        None => {
            tui::run_tui(controller, &config.service).await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
