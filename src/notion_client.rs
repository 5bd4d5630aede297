use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{PropertyMap, Record, RecordQuery, TableInfo};
use crate::store::RecordStore;

pub const NOTION_VERSION: &str = "2022-06-28";

/// Client for the Notion REST API.
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    results: Vec<Record>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RichTextSpan {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseObject {
    id: String,
    #[serde(default)]
    title: Vec<RichTextSpan>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

impl DatabaseObject {
    fn into_table_info(self) -> TableInfo {
        let title = self
            .title
            .into_iter()
            .next()
            .map(|span| span.plain_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        TableInfo { id: self.id, title }
    }
}

impl NotionClient {
    /// Creates a new `NotionClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The API base URL, e.g. `https://api.notion.com/v1`.
    /// * `token` - The integration token.
    pub fn new(base_url: String, token: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(AppError::from)
            .context("Failed to create Notion client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.notion_base_url.clone(), config.notion_api_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Response, AppError> {
        let response = builder
            .send()
            .await
            .map_err(AppError::from)
            .with_context(|| format!("Notion {} request failed", action))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApi(format!(
                "Notion {} returned {}: {}",
                action, status, error_text
            )));
        }

        Ok(response)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: Response,
        action: &str,
    ) -> Result<T, AppError> {
        response
            .json()
            .await
            .map_err(AppError::from)
            .with_context(|| format!("Failed to parse Notion {} response", action))
    }

    async fn fetch_page(
        &self,
        table: &str,
        query: &RecordQuery,
        cursor: Option<&str>,
    ) -> Result<QueryPage, AppError> {
        let mut body = query.to_json();
        if let (Some(c), Value::Object(map)) = (cursor, &mut body) {
            map.insert("start_cursor".to_string(), json!(c));
        }

        tracing::debug!("Querying Notion database {}: {}", table, body);
        let response = self
            .send(
                self.request(Method::POST, &format!("databases/{}/query", table))
                    .json(&body),
                "query",
            )
            .await?;
        Self::parse(response, "query").await
    }

    /// First page of results only, without following the cursor.
    pub async fn query_page(
        &self,
        table: &str,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, AppError> {
        Ok(self.fetch_page(table, query, None).await?.results)
    }

    /// Lists every database shared with the integration.
    pub async fn search_databases(&self) -> Result<Vec<TableInfo>, AppError> {
        let body = json!({
            "filter": { "property": "object", "value": "database" },
            "page_size": 100
        });
        let response = self
            .send(self.request(Method::POST, "search").json(&body), "search")
            .await?;
        let data: SearchResponse = Self::parse(response, "search").await?;

        Ok(data
            .results
            .into_iter()
            .filter(|r| r.get("object").and_then(Value::as_str) == Some("database"))
            .filter_map(|r| serde_json::from_value::<DatabaseObject>(r).ok())
            .map(DatabaseObject::into_table_info)
            .collect())
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Record>, AppError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(table, query, cursor.as_deref()).await?;
            records.extend(page.results);

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn create(&self, table: &str, properties: PropertyMap) -> Result<Record, AppError> {
        let body = json!({
            "parent": { "database_id": table },
            "properties": properties,
        });
        let response = self
            .send(self.request(Method::POST, "pages").json(&body), "page create")
            .await?;
        let record: Record = Self::parse(response, "page create").await?;

        tracing::info!("✓ Page created in database {}: {}", table, record.id);
        Ok(record)
    }

    async fn update(&self, record_id: &str, properties: PropertyMap) -> Result<Record, AppError> {
        let body = json!({ "properties": properties });
        let response = self
            .send(
                self.request(Method::PATCH, &format!("pages/{}", record_id))
                    .json(&body),
                "page update",
            )
            .await?;
        let record: Record = Self::parse(response, "page update").await?;

        tracing::info!("✓ Page updated: {}", record.id);
        Ok(record)
    }

    async fn retrieve(&self, table: &str) -> Result<TableInfo, AppError> {
        let response = self
            .send(
                self.request(Method::GET, &format!("databases/{}", table)),
                "database retrieve",
            )
            .await?;
        let database: DatabaseObject = Self::parse(response, "database retrieve").await?;
        Ok(database.into_table_info())
    }
}
