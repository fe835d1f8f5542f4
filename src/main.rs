use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dndwatch::config::Config;
use dndwatch::dispatch::{CycleKind, Dispatcher};
use dndwatch::rotation::RotationTable;
use dndwatch::scheduler::Scheduler;

#[derive(Parser)]
#[command(
    name = "dndwatch",
    version,
    about = "RuneScape Distractions & Diversions watcher with Telegram notifications",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trigger loop until interrupted
    Run,

    /// Execute a single cycle and exit
    Once {
        /// Which cycle to run
        #[arg(value_enum)]
        cycle: CycleArg,
    },

    /// Print the upcoming flash event schedule
    Next,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CycleArg {
    Daily,
    Hourly,
}

impl From<CycleArg> for CycleKind {
    fn from(arg: CycleArg) -> Self {
        match arg {
            CycleArg::Daily => CycleKind::Daily,
            CycleArg::Hourly => CycleKind::Hourly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    tracing::info!("dndwatch starting");

    match cli.command {
        Commands::Run => {
            let dispatcher = Dispatcher::from_config(&config)?;
            if dispatcher.sink_count() == 0 {
                tracing::warn!("No notification sink configured, cycles will only log");
            }

            let scheduler = Scheduler::new(config.schedule.clone(), dispatcher)?;
            tokio::select! {
                result = scheduler.start() => {
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, shutting down");
                    scheduler.stop().await;
                }
            }
        }

        Commands::Once { cycle } => {
            let dispatcher = Dispatcher::from_config(&config)?;
            let summary = dispatcher.run_cycle(cycle.into()).await;
            println!(
                "delivered: {}, suppressed: {}, failed: {}",
                summary.delivered, summary.suppressed, summary.failed
            );
        }

        Commands::Next => {
            let table = RotationTable::wilderness_flash_events();
            print!("{}", table.format_upcoming(Utc::now()));
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("dndwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("dndwatch=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
