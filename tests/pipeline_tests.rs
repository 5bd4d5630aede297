mod common;

use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::json;

use common::{daily, settings, text_of, InMemoryStore, DAILY_TABLE, WEEKLY_TABLE};
use weekly_success_sync::config::{DailyMetricsFields, Schema};
use weekly_success_sync::errors::AppError;
use weekly_success_sync::pipeline::WeeklyAggregation;
use weekly_success_sync::tier::Tier;
use weekly_success_sync::upsert::UpsertOutcome;

fn reference(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(y, m, d, 9, 30, 0)
        .unwrap()
}

fn january_week() -> Vec<weekly_success_sync::models::Record> {
    let f = DailyMetricsFields::default();
    vec![
        daily(
            "d-mon",
            "2024-01-08",
            &[
                (f.new_signups.as_str(), Some(2.0)),
                (f.workflows_run.as_str(), Some(10.0)),
                (f.mrr.as_str(), Some(900.0)),
                (f.active_users_30d.as_str(), Some(40.0)),
            ],
        ),
        daily(
            "d-wed",
            "2024-01-10",
            &[
                (f.new_signups.as_str(), Some(1.0)),
                (f.workflows_run.as_str(), Some(5.0)),
                (f.mrr.as_str(), Some(1234.5)),
                (f.active_users_30d.as_str(), Some(44.0)),
            ],
        ),
        daily(
            "d-thu",
            "2024-01-11",
            &[
                (f.new_signups.as_str(), None),
                (f.workflows_created_today.as_str(), Some(3.0)),
                (f.mrr.as_str(), None),
            ],
        ),
        // Outside the window
        daily(
            "d-next",
            "2024-01-15",
            &[(f.new_signups.as_str(), Some(50.0))],
        ),
    ]
}

#[tokio::test]
async fn first_run_creates_weekly_record() {
    let pipeline = WeeklyAggregation::new(InMemoryStore::with_daily(january_week()), settings());

    let report = pipeline.run(Some(reference(2024, 1, 10))).await.unwrap();

    assert!(matches!(report.outcome, UpsertOutcome::Created(_)));
    assert_eq!(report.aggregate.new_signups, 3);
    assert_eq!(report.aggregate.workflows_run, 15);
    assert_eq!(report.aggregate.workflows_created, 3);
    assert_eq!(report.aggregate.active_users_30d_avg, Some(42.0));
    assert_eq!(report.aggregate.days_reported, 3);
    assert_eq!(report.assessment.tier, Tier::Minimum);

    let weekly = pipeline.store().records(WEEKLY_TABLE);
    assert_eq!(weekly.len(), 1);
    let schema = Schema::default();
    let props = &weekly[0].properties;
    assert_eq!(
        props[&schema.weekly.week_starting],
        json!({ "date": { "start": "2024-01-08" } })
    );
    assert_eq!(
        text_of(&props[&schema.weekly.title], "title").as_deref(),
        Some("Week of Jan 08 - Jan 14, 2024")
    );
    assert_eq!(
        props[&schema.weekly.tier_achieved],
        json!({ "select": { "id": schema.tiers.minimum } })
    );
}

#[tokio::test]
async fn mrr_comes_from_most_recent_reporting_day() {
    let pipeline = WeeklyAggregation::new(InMemoryStore::with_daily(january_week()), settings());

    let report = pipeline.run(Some(reference(2024, 1, 12))).await.unwrap();

    // Thursday has no MRR, so Wednesday's value wins over Monday's.
    assert_eq!(report.aggregate.mrr, Some(1234.5));

    let weekly = pipeline.store().records(WEEKLY_TABLE);
    let notes = text_of(&weekly[0].properties[&Schema::default().weekly.notes], "rich_text")
        .unwrap();
    assert!(notes.contains("- MRR: $1,234.50"));
    assert!(notes.contains("- Workflows Run: 15"));
}

#[tokio::test]
async fn second_run_updates_the_same_record() {
    let pipeline = WeeklyAggregation::new(InMemoryStore::with_daily(january_week()), settings());

    let first = pipeline.run(Some(reference(2024, 1, 9))).await.unwrap();
    let after_first = pipeline.store().records(WEEKLY_TABLE);

    let second = pipeline.run(Some(reference(2024, 1, 13))).await.unwrap();
    let after_second = pipeline.store().records(WEEKLY_TABLE);

    assert!(matches!(first.outcome, UpsertOutcome::Created(_)));
    assert_eq!(
        second.outcome,
        UpsertOutcome::Updated(first.outcome.record_id().to_string())
    );
    assert_eq!(after_second.len(), 1);
    assert_eq!(after_first[0].properties, after_second[0].properties);
    assert_eq!(pipeline.store().create_count(), 1);
    assert_eq!(pipeline.store().update_count(), 1);
}

#[tokio::test]
async fn empty_week_writes_zero_record() {
    let pipeline = WeeklyAggregation::new(InMemoryStore::with_daily(january_week()), settings());

    let report = pipeline.run(Some(reference(2024, 2, 7))).await.unwrap();

    assert_eq!(report.aggregate, weekly_success_sync::models::WeeklyAggregate::empty());
    assert_eq!(report.assessment.tier, Tier::BelowMinimum);
    assert!(!report.assessment.minimum_met);

    let schema = Schema::default();
    let weekly = pipeline.store().records(WEEKLY_TABLE);
    assert_eq!(weekly.len(), 1);
    let props = &weekly[0].properties;
    assert_eq!(props[&schema.weekly.new_signups], json!({ "number": 0 }));
    assert_eq!(props[&schema.weekly.minimum_met], json!({ "checkbox": false }));
    assert_eq!(
        props[&schema.weekly.tier_achieved],
        json!({ "select": { "id": schema.tiers.below_minimum } })
    );
    let notes = text_of(&props[&schema.weekly.notes], "rich_text").unwrap();
    assert_eq!(
        notes,
        "Aggregated from Daily Metrics:\n- Workflows Run: 0\n- Workflows Created: 0\n"
    );
}

#[tokio::test]
async fn lookup_failure_falls_through_to_create() {
    let store = InMemoryStore::with_daily(january_week());
    let pipeline = WeeklyAggregation::new(store, settings());
    pipeline.run(Some(reference(2024, 1, 10))).await.unwrap();

    pipeline.store().fail_queries_on(WEEKLY_TABLE);
    let report = pipeline.run(Some(reference(2024, 1, 10))).await.unwrap();

    assert!(matches!(report.outcome, UpsertOutcome::Created(_)));
    assert_eq!(pipeline.store().records(WEEKLY_TABLE).len(), 2);
}

#[tokio::test]
async fn fetch_failure_aborts_before_writing() {
    let store = InMemoryStore::with_daily(january_week());
    store.fail_queries_on(DAILY_TABLE);
    let pipeline = WeeklyAggregation::new(store, settings());

    let err = pipeline.run(Some(reference(2024, 1, 10))).await.unwrap_err();

    assert!(matches!(err.root(), AppError::Fetch(_)));
    assert!(err.to_string().contains("during fetch"));
    assert!(pipeline.store().records(WEEKLY_TABLE).is_empty());
}

#[tokio::test]
async fn write_failure_is_reported_as_write_error() {
    let store = InMemoryStore::with_daily(january_week());
    *store.fail_writes.lock().unwrap() = true;
    let pipeline = WeeklyAggregation::new(store, settings());

    let err = pipeline.run(Some(reference(2024, 1, 10))).await.unwrap_err();

    assert!(matches!(err.root(), AppError::Write(_)));
    assert!(err.to_string().contains("during create"));
}
