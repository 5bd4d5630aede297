use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::pipeline::WeeklyAggregation;
use crate::store::RecordStore;

/// Every Friday at 08:00 local time (sec min hour day-of-month month day-of-week).
pub const WEEKLY_CRON: &str = "0 0 8 * * Fri";

/// Cron job that runs the aggregation for the current week.
///
/// A trigger that fires while the previous run is still going is skipped.
/// Failed runs are logged and never retried.
pub fn weekly_job<S>(
    cron: &str,
    pipeline: Arc<WeeklyAggregation<S>>,
) -> Result<Job, JobSchedulerError>
where
    S: RecordStore + 'static,
{
    let in_flight = Arc::new(Mutex::new(()));

    Job::new_async_tz(cron, Local, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);
        let in_flight = Arc::clone(&in_flight);
        Box::pin(async move {
            let Ok(_running) = in_flight.try_lock() else {
                tracing::warn!("Previous weekly aggregation still running, skipping this trigger");
                return;
            };

            tracing::info!("Scheduled job triggered - Running weekly aggregation");
            if let Err(e) = pipeline.run(None).await {
                tracing::error!("Error in scheduled job: {}", e);
            }
        })
    })
}

/// Starts the cron scheduler and blocks until Ctrl-C.
pub async fn run_until_ctrl_c<S>(
    cron: &str,
    pipeline: Arc<WeeklyAggregation<S>>,
) -> anyhow::Result<()>
where
    S: RecordStore + 'static,
{
    let mut sched = JobScheduler::new().await.context("creating scheduler")?;
    let job = weekly_job(cron, pipeline)
        .with_context(|| format!("creating scheduler job for cron {cron}"))?;
    sched.add(job).await.context("adding scheduler job")?;

    tracing::info!("Starting Weekly Notion Automation Scheduler");
    tracing::info!("Scheduled with cron '{}' (local time)", cron);
    sched.start().await.context("starting scheduler")?;

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    tracing::info!("Scheduler stopped by user");
    sched.shutdown().await.context("stopping scheduler")?;
    Ok(())
}
