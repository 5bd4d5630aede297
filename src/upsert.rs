//! Create-or-update of the weekly summary record, keyed by week start date.

use chrono::{Datelike, NaiveDate};

use crate::config::{Schema, WeeklyFields};
use crate::errors::{AppError, ResultExt};
use crate::models::{DateCondition, Filter, PropertyMap, PropertyValue, RecordQuery, WeeklyAggregate};
use crate::store::RecordStore;
use crate::tier::TierAssessment;
use crate::week::WeekWindow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(String),
    Updated(String),
}

impl UpsertOutcome {
    pub fn record_id(&self) -> &str {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Updated(id) => id,
        }
    }
}

/// Finds the weekly record whose week-start date equals `week_start`.
///
/// Lookup failures are logged and reported as "not found", so the caller
/// will create a new record. That can leave a duplicate for the week.
pub async fn find_existing<S>(
    store: &S,
    table: &str,
    fields: &WeeklyFields,
    week_start: NaiveDate,
) -> Option<String>
where
    S: RecordStore + ?Sized,
{
    let query = RecordQuery {
        filter: Some(Filter::date(
            fields.week_starting.clone(),
            DateCondition::Equals(week_start.to_string()),
        )),
        ..Default::default()
    };

    match store.query(table, &query).await {
        Ok(records) => {
            let id = records.into_iter().next().map(|r| r.id);
            if let Some(ref page_id) = id {
                tracing::info!(
                    "Found existing entry for week starting {}: {}",
                    week_start,
                    page_id
                );
            }
            id
        }
        Err(e) => {
            tracing::warn!("Error finding existing week entry: {}", e);
            None
        }
    }
}

/// "Week of Jan 08 - Jan 14, 2024", or with both years when the week spans two.
pub fn format_week_name(window: &WeekWindow) -> String {
    let monday = window.start_date();
    let sunday = window.end_date();
    let monday_str = monday.format("%b %d");
    let sunday_str = sunday.format("%b %d");

    if monday.year() != sunday.year() {
        format!(
            "Week of {}, {} - {}, {}",
            monday_str,
            monday.year(),
            sunday_str,
            sunday.year()
        )
    } else {
        format!("Week of {} - {}, {}", monday_str, sunday_str, monday.year())
    }
}

/// Formats as `$#,##0.00`.
pub fn format_currency(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

/// Free-text summary of the metrics that have no dedicated column.
pub fn build_notes(aggregate: &WeeklyAggregate) -> String {
    let mut lines = vec![
        "Aggregated from Daily Metrics:".to_string(),
        format!("- Workflows Run: {}", aggregate.workflows_run),
        format!("- Workflows Created: {}", aggregate.workflows_created),
    ];
    if let Some(mrr) = aggregate.mrr {
        lines.push(format!("- MRR: {}", format_currency(mrr)));
    }
    if let Some(avg) = aggregate.active_users_30d_avg {
        lines.push(format!("- Active Users (30d) Avg: {:.2}", avg));
    }
    if let Some(avg) = aggregate.activated_users_avg {
        lines.push(format!("- Activated Users Avg: {:.2}", avg));
    }

    lines.iter().map(|line| format!("{}\n", line)).collect()
}

/// Full property payload of a weekly record, week-start key included.
pub fn build_properties(
    window: &WeekWindow,
    aggregate: &WeeklyAggregate,
    assessment: &TierAssessment,
    schema: &Schema,
) -> PropertyMap {
    let fields = &schema.weekly;
    let tier_id = assessment.tier.option_id(&schema.tiers).to_string();

    let values = [
        (&fields.title, PropertyValue::Title(format_week_name(window))),
        (&fields.week_starting, PropertyValue::Date(window.start_date())),
        (&fields.new_signups, PropertyValue::Number(aggregate.new_signups)),
        (
            &fields.user_calls_booked,
            PropertyValue::Number(aggregate.user_calls_booked),
        ),
        (
            &fields.welcome_emails_sent,
            PropertyValue::Number(aggregate.welcome_emails_sent),
        ),
        (&fields.tier_achieved, PropertyValue::Select { id: tier_id }),
        (&fields.minimum_met, PropertyValue::Checkbox(assessment.minimum_met)),
        (&fields.good_met, PropertyValue::Checkbox(assessment.good_met)),
        (&fields.great_met, PropertyValue::Checkbox(assessment.great_met)),
        (&fields.notes, PropertyValue::RichText(build_notes(aggregate))),
    ];

    values
        .into_iter()
        .map(|(id, value)| (id.clone(), value.to_json()))
        .collect()
}

/// Writes the weekly record: update in place when `existing` names one,
/// otherwise create. The week-start key is only written on create.
pub async fn write_summary<S>(
    store: &S,
    table: &str,
    schema: &Schema,
    existing: Option<String>,
    window: &WeekWindow,
    aggregate: &WeeklyAggregate,
    assessment: &TierAssessment,
) -> Result<UpsertOutcome, AppError>
where
    S: RecordStore + ?Sized,
{
    let week_name = format_week_name(window);
    let mut properties = build_properties(window, aggregate, assessment, schema);

    match existing {
        Some(page_id) => {
            tracing::info!("Updating existing weekly entry: {}", week_name);
            properties.remove(&schema.weekly.week_starting);
            store
                .update(&page_id, properties)
                .await
                .map_err(|e| AppError::Write(e.to_string()))
                .with_context(|| format!("updating weekly entry {}", page_id))?;
            tracing::info!("Successfully updated weekly entry: {}", page_id);
            Ok(UpsertOutcome::Updated(page_id))
        }
        None => {
            tracing::info!("Creating new weekly entry: {}", week_name);
            let record = store
                .create(table, properties)
                .await
                .map_err(|e| AppError::Write(e.to_string()))
                .context("creating weekly entry")?;
            tracing::info!("Successfully created weekly entry: {}", record.id);
            Ok(UpsertOutcome::Created(record.id))
        }
    }
}

/// Lookup by week start, then create or update.
pub async fn upsert<S>(
    store: &S,
    table: &str,
    schema: &Schema,
    window: &WeekWindow,
    aggregate: &WeeklyAggregate,
    assessment: &TierAssessment,
) -> Result<UpsertOutcome, AppError>
where
    S: RecordStore + ?Sized,
{
    let existing = find_existing(store, table, &schema.weekly, window.start_date()).await;
    write_summary(store, table, schema, existing, window, aggregate, assessment).await
}
