use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{PropertyMap, Record, RecordQuery, TableInfo};

/// Remote tabular record store holding both the daily and weekly tables.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every record of `table` matching `query`, in the requested order.
    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Record>, AppError>;

    /// Creates a record in `table`.
    async fn create(&self, table: &str, properties: PropertyMap) -> Result<Record, AppError>;

    /// Overwrites the given properties of an existing record.
    async fn update(&self, record_id: &str, properties: PropertyMap) -> Result<Record, AppError>;

    /// Fetches table metadata.
    async fn retrieve(&self, table: &str) -> Result<TableInfo, AppError>;
}
