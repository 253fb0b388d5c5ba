mod app;
mod controller;
mod input;
mod inquiry;
mod models_cmd;
mod sessions_cmd;
mod terminal_output;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use codebuddy_config::{config_dir, config_file_path, load_and_prepare, MAX_CAPTURE_INTERVAL_SECS};
use codebuddy_logging::init_logger;
use tracing::{info, warn};

use app::AppContext;
use controller::InteractionController;
use input::StdinLines;
use terminal_output::print_banner;

#[derive(Parser)]
#[command(name = "codebuddy")]
#[command(about = "CodeBuddy: a screen activity log you can ask questions about")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the screen in the background and answer questions (default)
    Run(RunArgs),
    /// List recorded sessions, newest first
    Sessions,
    /// List providers, their models, and credential status
    Models,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Seconds between screen captures
    #[arg(short, long)]
    interval: Option<u64>,

    /// Continue from the most recent session's log
    #[arg(short = 'c', long = "continue")]
    continue_previous: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_file = dotenvy::dotenv().ok();

    let config_dir = config_dir();
    let config_path = config_file_path(&config_dir);
    let loaded = load_and_prepare(&config_path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    let mut config = loaded.config;

    let log_dir = config_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let guard = init_logger(&log_dir, &config.log_level);
    info!(
        config = %config_path.display(),
        env_file = ?env_file,
        "Starting CodeBuddy"
    );
    for warning in &loaded.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            if let Some(interval) = args.interval {
                if interval == 0 || interval > MAX_CAPTURE_INTERVAL_SECS {
                    bail!("--interval must be between 1 and {MAX_CAPTURE_INTERVAL_SECS} seconds");
                }
                config.capture_interval_secs = interval;
            }
            let continue_previous = args.continue_previous || config.continue_previous;

            let app = AppContext::new(config)?;
            let active = app.start_session(continue_previous).await?;
            print_banner(active.id(), app.config.capture_interval_secs);

            let controller = InteractionController::new(
                Arc::clone(&app.sessions),
                Arc::clone(&app.model),
                Arc::new(app.capture_loop()),
                app.qa_settings(),
            );
            controller.run(StdinLines::new()).await?;

            drop(guard);
            // The blocking stdin reader would otherwise hold the runtime open.
            std::process::exit(0);
        }
        Commands::Sessions => sessions_cmd::run(&config.sessions_dir).await,
        Commands::Models => models_cmd::run(&config),
    }
}
