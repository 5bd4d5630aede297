//! Lists the Notion databases the integration can see, or extracts database
//! IDs from Notion URLs passed as arguments.

use regex::Regex;
use uuid::Uuid;

use weekly_success_sync::config::{Config, DEFAULT_DAILY_METRICS_DB_ID, DEFAULT_WEEKLY_SUCCESS_DB_ID};
use weekly_success_sync::notion_client::NotionClient;

/// Extracts a database ID from a Notion URL, normalized to hyphenated form.
fn extract_database_id(url: &str) -> Option<String> {
    let patterns = [
        r"notion\.so/[^/]+/(?:[^/?]*-)?([a-f0-9]{32})",
        r"notion\.so/(?:[^/?]*-)?([a-f0-9]{32})",
        r"([a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})",
    ];

    patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        let raw = re.captures(url)?.get(1)?.as_str();
        Uuid::parse_str(raw).ok().map(|id| id.hyphenated().to_string())
    })
}

fn print_access_help() {
    println!("How to grant access:");
    println!("1. Open your database in Notion");
    println!("2. Click '...' (three dots) in the top right");
    println!("3. Click 'Connections' → 'Add connections'");
    println!("4. Select your integration");
    println!("5. Run this tool again to verify\n");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let urls: Vec<String> = std::env::args().skip(1).collect();
    if !urls.is_empty() {
        for url in &urls {
            match extract_database_id(url) {
                Some(id) => println!("{} -> {}", url, id),
                None => println!("{} -> no database ID found", url),
            }
        }
        return Ok(());
    }

    println!("{}", "=".repeat(60));
    println!("Notion Database ID Finder");
    println!("{}", "=".repeat(60));

    let config = Config::from_env()?;
    let client = NotionClient::from_config(&config)?;

    let databases = match client.search_databases().await {
        Ok(databases) => databases,
        Err(e) => {
            println!("❌ Error: {}", e);
            println!("\nMake sure:");
            println!("1. Your NOTION_API_KEY is correct in .env");
            println!("2. Your integration has been created at https://www.notion.so/my-integrations");
            return Err(e.into());
        }
    };

    if databases.is_empty() {
        println!("\n❌ No databases found.");
        println!("Your integration has not been granted access to any databases yet,");
        println!("or the databases are nested inside pages that are not shared.\n");
        print_access_help();
        return Ok(());
    }

    println!("\n✅ Found {} accessible database(s):\n", databases.len());
    for (i, db) in databases.iter().enumerate() {
        println!("{}. {}", i + 1, db.title);
        println!("   ID: {}\n", db.id);
    }

    println!("Current database IDs in use:");
    println!("  Daily Metrics: {}", config.daily_metrics_db_id);
    println!("  Weekly Success: {}", config.weekly_success_db_id);
    if config.daily_metrics_db_id != DEFAULT_DAILY_METRICS_DB_ID
        || config.weekly_success_db_id != DEFAULT_WEEKLY_SUCCESS_DB_ID
    {
        println!("  (overridden from environment)");
    }

    Ok(())
}
