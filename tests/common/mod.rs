//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use weekly_success_sync::config::{Config, DailyMetricsFields};
use weekly_success_sync::errors::AppError;
use weekly_success_sync::extract::parse_timestamp;
use weekly_success_sync::models::{
    DateCondition, Filter, PropertyMap, Record, RecordQuery, SortDirection, TableInfo,
};
use weekly_success_sync::pipeline::PipelineSettings;
use weekly_success_sync::store::RecordStore;

pub const DAILY_TABLE: &str = "daily-db";
pub const WEEKLY_TABLE: &str = "weekly-db";

pub fn settings() -> PipelineSettings {
    let mut config = Config::with_token("secret_test");
    config.daily_metrics_db_id = DAILY_TABLE.to_string();
    config.weekly_success_db_id = WEEKLY_TABLE.to_string();
    PipelineSettings::from(&config)
}

/// Builds one daily record dated `date` with the given number properties.
pub fn daily(id: &str, date: &str, numbers: &[(&str, Option<f64>)]) -> Record {
    let fields = DailyMetricsFields::default();
    let mut properties = Map::new();
    properties.insert(
        fields.date,
        json!({ "id": "dIHs", "type": "date", "date": { "start": date, "end": null } }),
    );
    for (field, value) in numbers {
        properties.insert(
            field.to_string(),
            json!({ "id": field, "type": "number", "number": value }),
        );
    }
    Record {
        id: id.to_string(),
        properties,
    }
}

/// In-memory record store that understands the date filters and sorts the
/// pipeline issues.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    next_id: Mutex<u32>,
    pub fail_query_tables: Mutex<Vec<String>>,
    pub fail_writes: Mutex<bool>,
    pub creates: Mutex<u32>,
    pub updates: Mutex<u32>,
}

impl InMemoryStore {
    pub fn with_daily(records: Vec<Record>) -> Self {
        let store = Self::default();
        store
            .tables
            .lock()
            .unwrap()
            .insert(DAILY_TABLE.to_string(), records);
        store
    }

    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_queries_on(&self, table: &str) {
        self.fail_query_tables.lock().unwrap().push(table.to_string());
    }

    pub fn create_count(&self) -> u32 {
        *self.creates.lock().unwrap()
    }

    pub fn update_count(&self) -> u32 {
        *self.updates.lock().unwrap()
    }
}

fn date_start(record: &Record, property: &str) -> Option<String> {
    record
        .properties
        .get(property)?
        .get("date")?
        .get("start")?
        .as_str()
        .map(str::to_string)
}

fn matches(record: &Record, filter: &Filter) -> bool {
    match filter {
        Filter::And(filters) => filters.iter().all(|f| matches(record, f)),
        Filter::Date {
            property,
            condition,
        } => {
            let Some(value) = date_start(record, property).and_then(|s| parse_timestamp(&s))
            else {
                return false;
            };
            match condition {
                DateCondition::OnOrAfter(bound) => {
                    parse_timestamp(bound).is_some_and(|b| value >= b)
                }
                DateCondition::OnOrBefore(bound) => {
                    parse_timestamp(bound).is_some_and(|b| value <= b)
                }
                DateCondition::Equals(bound) => {
                    parse_timestamp(bound).is_some_and(|b| value.date_naive() == b.date_naive())
                }
            }
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Record>, AppError> {
        if self.fail_query_tables.lock().unwrap().iter().any(|t| t == table) {
            return Err(AppError::ExternalApi(format!("query on {} refused", table)));
        }

        let mut results: Vec<Record> = self
            .records(table)
            .into_iter()
            .filter(|r| query.filter.as_ref().map_or(true, |f| matches(r, f)))
            .collect();

        for sort in query.sorts.iter().rev() {
            results.sort_by(|a, b| {
                let ka = date_start(a, &sort.property).and_then(|s| parse_timestamp(&s));
                let kb = date_start(b, &sort.property).and_then(|s| parse_timestamp(&s));
                match sort.direction {
                    SortDirection::Ascending => ka.cmp(&kb),
                    SortDirection::Descending => kb.cmp(&ka),
                }
            });
        }

        if let Some(size) = query.page_size {
            results.truncate(size as usize);
        }
        Ok(results)
    }

    async fn create(&self, table: &str, properties: PropertyMap) -> Result<Record, AppError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(AppError::ExternalApi("create refused".to_string()));
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("page-{}", *next)
        };
        let record = Record { id, properties };
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        *self.creates.lock().unwrap() += 1;
        Ok(record)
    }

    async fn update(&self, record_id: &str, properties: PropertyMap) -> Result<Record, AppError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(AppError::ExternalApi("update refused".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        let record = tables
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| r.id == record_id)
            .ok_or_else(|| AppError::ExternalApi(format!("no page {}", record_id)))?;
        for (key, value) in properties {
            record.properties.insert(key, value);
        }
        *self.updates.lock().unwrap() += 1;
        Ok(record.clone())
    }

    async fn retrieve(&self, table: &str) -> Result<TableInfo, AppError> {
        Ok(TableInfo {
            id: table.to_string(),
            title: table.to_string(),
        })
    }
}

/// Text content of a rich_text/title property.
pub fn text_of(value: &Value, kind: &str) -> Option<String> {
    value
        .get(kind)?
        .get(0)?
        .get("text")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
