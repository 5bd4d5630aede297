//! Weekly Success Sync Library
//!
//! Rolls the daily operational metrics kept in one Notion database up into a
//! weekly success-criteria record in another, classifying the week into a
//! tier along the way.
//!
//! # Modules
//!
//! - `aggregate`: Daily-to-weekly rollup (sums, averages, latest value).
//! - `config`: Configuration and external schema mapping.
//! - `errors`: Error handling types.
//! - `extract`: Fail-soft typed reads from record properties.
//! - `logging`: Tracing subscriber setup.
//! - `models`: Records, query types and the weekly aggregate.
//! - `notion_client`: Notion REST API client.
//! - `pipeline`: One end-to-end aggregation run.
//! - `scheduler`: Weekly trigger.
//! - `store`: Record store abstraction.
//! - `tier`: Tier classification.
//! - `upsert`: Create-or-update of the weekly record.
//! - `week`: Monday-to-Sunday windowing.

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod models;
pub mod notion_client;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod tier;
pub mod upsert;
pub mod week;
