use serde::Deserialize;

use crate::errors::AppError;

pub const DEFAULT_DAILY_METRICS_DB_ID: &str = "373f0ed0-4d5b-4e8a-9e90-9bc8d7b5a16a";
pub const DEFAULT_WEEKLY_SUCCESS_DB_ID: &str = "9e04bcc9-471d-4372-9e0f-5f0a9111e87b";
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub notion_api_key: String,
    pub notion_base_url: String,
    pub daily_metrics_db_id: String,
    pub weekly_success_db_id: String,
    pub log_dir: String,
    pub schema: Schema,
}

/// Property IDs of the daily metrics table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DailyMetricsFields {
    pub date: String,
    pub mrr: String,
    pub new_signups: String,
    pub visit_signup_pct: String,
    pub active_users_30d: String,
    pub activated_users: String,
    pub activation_rate_pct: String,
    pub workflows_run: String,
    pub workflows_created_today: String,
    pub active_users_7d_avg: String,
}

impl Default for DailyMetricsFields {
    fn default() -> Self {
        Self {
            date: "dIHs".to_string(),
            mrr: "R%60uR".to_string(),
            new_signups: "kvo%3C".to_string(),
            visit_signup_pct: "QtVP".to_string(),
            active_users_30d: "hp%40%7D".to_string(),
            activated_users: "NOQM".to_string(),
            activation_rate_pct: "PFsb".to_string(),
            workflows_run: "aJMX".to_string(),
            workflows_created_today: "sTE~".to_string(),
            active_users_7d_avg: "%5B%7B%3FZ".to_string(),
        }
    }
}

/// Property IDs of the weekly success criteria table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WeeklyFields {
    pub title: String,
    pub week_starting: String,
    pub new_signups: String,
    pub user_calls_booked: String,
    pub welcome_emails_sent: String,
    pub tier_achieved: String,
    pub minimum_met: String,
    pub good_met: String,
    pub great_met: String,
    pub notes: String,
}

impl Default for WeeklyFields {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            week_starting: "WikD".to_string(),
            new_signups: "~%7BH~".to_string(),
            user_calls_booked: "Ufki".to_string(),
            welcome_emails_sent: "GVjV".to_string(),
            tier_achieved: "tk%40n".to_string(),
            minimum_met: "N_T%7B".to_string(),
            good_met: "%5COm%40".to_string(),
            great_met: "%5B%3DDh".to_string(),
            notes: "_Mhj".to_string(),
        }
    }
}

/// Select-option IDs of the `tier_achieved` property.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TierOptions {
    pub below_minimum: String,
    pub minimum: String,
    pub good: String,
    pub great: String,
}

impl Default for TierOptions {
    fn default() -> Self {
        Self {
            below_minimum: "4f784ace-fca1-4da1-9c55-22cb23e08906".to_string(),
            minimum: "2462be85-3662-415e-819f-33b78fa31a8b".to_string(),
            good: "e73e24e5-ae51-4939-891a-9b85c0424cd1".to_string(),
            great: "0244d663-3981-4c07-900e-e654896570b8".to_string(),
        }
    }
}

/// Mapping onto the external table schema. Must match the live tables exactly.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Schema {
    pub daily: DailyMetricsFields,
    pub weekly: WeeklyFields,
    pub tiers: TierOptions,
}

fn required_non_empty(var: &str) -> Result<String, AppError> {
    std::env::var(var)
        .map_err(|_| AppError::Configuration(format!("{} environment variable required", var)))
        .and_then(|value| {
            if value.trim().is_empty() {
                return Err(AppError::Configuration(format!("{} cannot be empty", var)));
            }
            Ok(value)
        })
}

fn optional_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let notion_base_url = optional_or("NOTION_BASE_URL", DEFAULT_NOTION_BASE_URL);
        if !notion_base_url.starts_with("http://") && !notion_base_url.starts_with("https://") {
            return Err(AppError::Configuration(
                "NOTION_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let config = Self {
            notion_api_key: required_non_empty("NOTION_API_KEY")?,
            notion_base_url: notion_base_url.trim_end_matches('/').to_string(),
            daily_metrics_db_id: optional_or(
                "EASYFLOW_DAILY_METRICS_DB_ID",
                DEFAULT_DAILY_METRICS_DB_ID,
            ),
            weekly_success_db_id: optional_or(
                "WEEKLY_SUCCESS_CRITERIA_DB_ID",
                DEFAULT_WEEKLY_SUCCESS_DB_ID,
            ),
            log_dir: optional_or("LOG_DIR", DEFAULT_LOG_DIR),
            schema: Schema::default(),
        };

        Ok(config)
    }

    /// Logs the loaded configuration without sensitive values.
    ///
    /// Called once the subscriber is up, since the log directory comes from here.
    pub fn log_loaded(&self) {
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Notion Base URL: {}", self.notion_base_url);
        tracing::debug!("Daily Metrics DB: {}", self.daily_metrics_db_id);
        tracing::debug!("Weekly Success DB: {}", self.weekly_success_db_id);
        tracing::debug!("Log directory: {}", self.log_dir);
    }

    /// Config for tests and tooling that do not read the environment.
    pub fn with_token(notion_api_key: impl Into<String>) -> Self {
        Self {
            notion_api_key: notion_api_key.into(),
            notion_base_url: DEFAULT_NOTION_BASE_URL.to_string(),
            daily_metrics_db_id: DEFAULT_DAILY_METRICS_DB_ID.to_string(),
            weekly_success_db_id: DEFAULT_WEEKLY_SUCCESS_DB_ID.to_string(),
            log_dir: DEFAULT_LOG_DIR.to_string(),
            schema: Schema::default(),
        }
    }
}
