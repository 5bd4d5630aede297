use crate::config::DailyMetricsFields;
use crate::extract::{extract_date, extract_number};
use crate::models::{DailyRecord, WeeklyAggregate};

/// Arithmetic mean over the values that were present.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    total: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as f64)
        }
    }
}

/// Reduces a week of daily records into one [`WeeklyAggregate`].
///
/// `records` must be sorted newest first: `mrr` takes the first non-null
/// value in input order. With no records the result equals
/// [`WeeklyAggregate::empty`].
pub fn aggregate_weekly(records: &[DailyRecord], fields: &DailyMetricsFields) -> WeeklyAggregate {
    tracing::info!("Aggregating data from {} records", records.len());

    let mut new_signups = 0.0;
    let mut workflows_run = 0.0;
    let mut workflows_created = 0.0;

    let mut active_users_30d = Mean::default();
    let mut activated_users = Mean::default();
    let mut visit_signup_pct = Mean::default();
    let mut active_users_7d = Mean::default();

    let mut latest_mrr = None;
    let mut latest_entry = None;

    for record in records {
        new_signups += extract_number(record, &fields.new_signups).unwrap_or(0.0);
        workflows_run += extract_number(record, &fields.workflows_run).unwrap_or(0.0);
        workflows_created +=
            extract_number(record, &fields.workflows_created_today).unwrap_or(0.0);

        active_users_30d.push(extract_number(record, &fields.active_users_30d));
        activated_users.push(extract_number(record, &fields.activated_users));
        visit_signup_pct.push(extract_number(record, &fields.visit_signup_pct));
        active_users_7d.push(extract_number(record, &fields.active_users_7d_avg));

        if latest_mrr.is_none() {
            latest_mrr = extract_number(record, &fields.mrr);
        }

        if let Some(date) = extract_date(record, &fields.date) {
            latest_entry = match latest_entry {
                Some(current) if current >= date => Some(current),
                _ => Some(date),
            };
        }
    }

    let aggregate = WeeklyAggregate {
        // truncates toward zero
        new_signups: new_signups as i64,
        workflows_run: workflows_run as i64,
        workflows_created: workflows_created as i64,
        active_users_30d_avg: active_users_30d.value(),
        activated_users_avg: activated_users.value(),
        visit_signup_pct_avg: visit_signup_pct.value(),
        active_users_7d_avg: active_users_7d.value(),
        mrr: latest_mrr,
        user_calls_booked: 0,
        welcome_emails_sent: 0,
        days_reported: records.len(),
        latest_entry,
    };

    tracing::info!("Aggregated metrics: {:?}", aggregate);
    aggregate
}
