//! One weekly aggregation run.
//!
//! Stages, in order: window, fetch, aggregate, classify, lookup, then
//! create or update. Any unrecovered error ends the run and is returned
//! tagged with the stage it failed in; nothing is retried here.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::aggregate::aggregate_weekly;
use crate::config::Schema;
use crate::errors::AppError;
use crate::models::{DailyRecord, DateCondition, Filter, RecordQuery, Sort, WeeklyAggregate};
use crate::store::RecordStore;
use crate::tier::{classify, TierAssessment};
use crate::upsert::{find_existing, write_summary, UpsertOutcome};
use crate::week::WeekWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Window,
    Fetch,
    Aggregate,
    Classify,
    Lookup,
    Create,
    Update,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Window => "window",
            RunStage::Fetch => "fetch",
            RunStage::Aggregate => "aggregate",
            RunStage::Classify => "classify",
            RunStage::Lookup => "lookup",
            RunStage::Create => "create",
            RunStage::Update => "update",
            RunStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub window: WeekWindow,
    pub aggregate: WeeklyAggregate,
    pub assessment: TierAssessment,
    pub outcome: UpsertOutcome,
}

/// Table IDs plus schema mapping for one deployment.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub daily_table: String,
    pub weekly_table: String,
    pub schema: Schema,
}

impl From<&crate::config::Config> for PipelineSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            daily_table: config.daily_metrics_db_id.clone(),
            weekly_table: config.weekly_success_db_id.clone(),
            schema: config.schema.clone(),
        }
    }
}

/// Drives one aggregation run against a record store.
pub struct WeeklyAggregation<S> {
    store: S,
    settings: PipelineSettings,
}

impl<S: RecordStore> WeeklyAggregation<S> {
    pub fn new(store: S, settings: PipelineSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Daily records in the window, newest first.
    pub async fn fetch_daily_records(
        &self,
        window: &WeekWindow,
    ) -> Result<Vec<DailyRecord>, AppError> {
        let date_field = &self.settings.schema.daily.date;
        tracing::info!(
            "Querying Daily Metrics from {} to {}",
            window.start_date(),
            window.end_date()
        );

        let query = RecordQuery {
            filter: Some(Filter::And(vec![
                Filter::date(
                    date_field.clone(),
                    DateCondition::OnOrAfter(window.start.to_rfc3339()),
                ),
                Filter::date(
                    date_field.clone(),
                    DateCondition::OnOrBefore(window.end.to_rfc3339()),
                ),
            ])),
            sorts: vec![Sort::descending(date_field.clone())],
            page_size: None,
        };

        let records = self
            .store
            .query(&self.settings.daily_table, &query)
            .await
            .map_err(|e| {
                tracing::error!("Error querying Daily Metrics: {}", e);
                AppError::Fetch(e.to_string())
            })?;

        tracing::info!("Found {} daily metric entries for the week", records.len());
        Ok(records)
    }

    /// Runs the pipeline for the week containing `reference` (now when `None`).
    pub async fn run(
        &self,
        reference: Option<DateTime<FixedOffset>>,
    ) -> Result<RunReport, AppError> {
        tracing::info!("{}", "=".repeat(60));
        tracing::info!("Starting Weekly Aggregation");
        tracing::info!("{}", "=".repeat(60));

        let mut stage = RunStage::Window;
        match self.run_stages(reference, &mut stage).await {
            Ok(report) => {
                tracing::info!("{}", "=".repeat(60));
                tracing::info!(
                    "Weekly Aggregation Completed Successfully ({:?} {})",
                    report.outcome,
                    report.window.start_date()
                );
                tracing::info!("{}", "=".repeat(60));
                Ok(report)
            }
            Err(e) => {
                tracing::error!("{}", "=".repeat(60));
                tracing::error!("Weekly Aggregation Failed during {}: {}", stage, e);
                tracing::error!("{}", "=".repeat(60));
                Err(AppError::WithContext {
                    source: Box::new(e),
                    context: format!("weekly aggregation failed during {}", stage),
                })
            }
        }
    }

    async fn run_stages(
        &self,
        reference: Option<DateTime<FixedOffset>>,
        stage: &mut RunStage,
    ) -> Result<RunReport, AppError> {
        let window = WeekWindow::for_reference(reference);
        tracing::info!("Week range: {} to {}", window.start_date(), window.end_date());

        *stage = RunStage::Fetch;
        let daily = self.fetch_daily_records(&window).await?;

        *stage = RunStage::Aggregate;
        let aggregate = if daily.is_empty() {
            tracing::warn!(
                "No daily metrics found for week {} to {}",
                window.start_date(),
                window.end_date()
            );
            tracing::warn!("Creating entry with zero values");
            WeeklyAggregate::empty()
        } else {
            aggregate_weekly(&daily, &self.settings.schema.daily)
        };

        *stage = RunStage::Classify;
        let assessment = classify(
            aggregate.new_signups,
            aggregate.user_calls_booked,
            aggregate.welcome_emails_sent,
        );
        tracing::info!(
            "Tier calculation: tier={}, minimum_met={}, good_met={}, great_met={}",
            assessment.tier.as_str(),
            assessment.minimum_met,
            assessment.good_met,
            assessment.great_met
        );

        *stage = RunStage::Lookup;
        let settings = &self.settings;
        let existing = find_existing(
            &self.store,
            &settings.weekly_table,
            &settings.schema.weekly,
            window.start_date(),
        )
        .await;

        *stage = if existing.is_some() {
            RunStage::Update
        } else {
            RunStage::Create
        };
        let outcome = write_summary(
            &self.store,
            &settings.weekly_table,
            &settings.schema,
            existing,
            &window,
            &aggregate,
            &assessment,
        )
        .await?;

        *stage = RunStage::Done;
        Ok(RunReport {
            window,
            aggregate,
            assessment,
            outcome,
        })
    }
}
