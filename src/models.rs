use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Property payload keyed by field ID.
pub type PropertyMap = serde_json::Map<String, Value>;

// ============ Record Store Models ============

/// A record (page) in the external record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque record identifier.
    pub id: String,
    /// Typed properties keyed by field ID.
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Daily records are plain store records, read-only for this crate.
pub type DailyRecord = Record;

/// Metadata about a table (database), used by the connection check.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub property: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "property": self.property,
            "direction": self.direction.as_str(),
        })
    }
}

/// Date comparison operand, ISO-8601 formatted.
#[derive(Debug, Clone, PartialEq)]
pub enum DateCondition {
    OnOrAfter(String),
    OnOrBefore(String),
    Equals(String),
}

impl DateCondition {
    fn to_json(&self) -> Value {
        match self {
            DateCondition::OnOrAfter(v) => json!({ "on_or_after": v }),
            DateCondition::OnOrBefore(v) => json!({ "on_or_before": v }),
            DateCondition::Equals(v) => json!({ "equals": v }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Date {
        property: String,
        condition: DateCondition,
    },
}

impl Filter {
    pub fn date(property: impl Into<String>, condition: DateCondition) -> Self {
        Filter::Date {
            property: property.into(),
            condition,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::And(filters) => {
                json!({ "and": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Date {
                property,
                condition,
            } => json!({ "property": property, "date": condition.to_json() }),
        }
    }
}

/// Query against one table: AND-combined filters, sorts and an optional page size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub filter: Option<Filter>,
    pub sorts: Vec<Sort>,
    pub page_size: Option<u32>,
}

impl RecordQuery {
    /// Request body without pagination cursor.
    pub fn to_json(&self) -> Value {
        let mut body = serde_json::Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), filter.to_json());
        }
        if !self.sorts.is_empty() {
            body.insert(
                "sorts".to_string(),
                Value::Array(self.sorts.iter().map(Sort::to_json).collect()),
            );
        }
        if let Some(size) = self.page_size {
            body.insert("page_size".to_string(), json!(size));
        }
        Value::Object(body)
    }
}

/// A typed property value as written to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Date(NaiveDate),
    Number(i64),
    Checkbox(bool),
    Select { id: String },
}

impl PropertyValue {
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Title(text) => json!({ "title": [{ "text": { "content": text } }] }),
            PropertyValue::RichText(text) => {
                json!({ "rich_text": [{ "text": { "content": text } }] })
            }
            PropertyValue::Date(date) => json!({ "date": { "start": date.to_string() } }),
            PropertyValue::Number(n) => json!({ "number": n }),
            PropertyValue::Checkbox(b) => json!({ "checkbox": b }),
            PropertyValue::Select { id } => json!({ "select": { "id": id } }),
        }
    }
}

// ============ Aggregation Models ============

/// Weekly rollup of the daily metrics.
///
/// Sums default to 0 ("no activity"); averages and latest values default to
/// `None` ("no data").
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyAggregate {
    pub new_signups: i64,
    pub workflows_run: i64,
    pub workflows_created: i64,
    pub active_users_30d_avg: Option<f64>,
    pub activated_users_avg: Option<f64>,
    pub visit_signup_pct_avg: Option<f64>,
    pub active_users_7d_avg: Option<f64>,
    pub mrr: Option<f64>,
    /// No source field yet.
    pub user_calls_booked: i64,
    /// No source field yet.
    pub welcome_emails_sent: i64,
    /// Number of daily records that were aggregated.
    pub days_reported: usize,
    /// Most recent daily date seen.
    pub latest_entry: Option<DateTime<FixedOffset>>,
}

impl WeeklyAggregate {
    /// Aggregate used when the week has no daily records.
    pub fn empty() -> Self {
        Self::default()
    }
}
