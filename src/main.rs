use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};
use clap::{Parser, Subcommand};

use weekly_success_sync::config::Config;
use weekly_success_sync::errors::AppError;
use weekly_success_sync::logging;
use weekly_success_sync::notion_client::NotionClient;
use weekly_success_sync::pipeline::{PipelineSettings, WeeklyAggregation};
use weekly_success_sync::scheduler::{self, WEEKLY_CRON};

#[derive(Parser)]
#[command(name = "weekly-success-sync")]
#[command(about = "Aggregates EasyFlow daily metrics into weekly success criteria", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate one week and write its summary record
    Run {
        /// Any day of the week to aggregate (defaults to the current week)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run every Friday at 08:00 until stopped
    Schedule,
}

/// Local midnight of `date` as a reference timestamp.
fn local_reference(date: NaiveDate) -> Result<DateTime<FixedOffset>, AppError> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| AppError::InvalidInput(format!("{} has no local midnight", date)))
}

/// Main entry point.
///
/// Loads configuration, initializes logging into its log directory, builds
/// the Notion client and
/// either runs a single aggregation or starts the weekly scheduler.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => {
            logging::init(Some(Path::new(&config.log_dir)));
            config.log_loaded();
            config
        }
        Err(e) => {
            logging::init(None);
            tracing::error!("Fatal error: {}", e);
            return Err(e.into());
        }
    };
    let client = NotionClient::from_config(&config)?;
    let pipeline = WeeklyAggregation::new(client, PipelineSettings::from(&config));

    match cli.command {
        Commands::Run { date } => {
            let reference = date.map(local_reference).transpose()?;
            if let Err(e) = pipeline.run(reference).await {
                tracing::error!("Fatal error: {}", e);
                return Err(e.into());
            }
        }
        Commands::Schedule => {
            scheduler::run_until_ctrl_c(WEEKLY_CRON, Arc::new(pipeline)).await?;
        }
    }

    Ok(())
}
