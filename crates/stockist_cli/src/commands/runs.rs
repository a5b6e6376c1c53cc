//! Run history listing.

use chrono::{DateTime, Utc};
use console::style;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use stockist::{RunQuery, RunStatus, SqlCatalogStore, SyncRunModel, connect_and_migrate};
use stockist::store::CatalogStore;

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "started")]
    started: String,
    #[tabled(rename = "vendor")]
    vendor: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "total")]
    total: i32,
    #[tabled(rename = "+")]
    created: i32,
    #[tabled(rename = "~")]
    updated: i32,
    #[tabled(rename = "-")]
    removed: i32,
    #[tabled(rename = "=")]
    unchanged: i32,
    #[tabled(rename = "ms")]
    duration: String,
    #[tabled(rename = "actor")]
    actor: String,
}

impl From<&SyncRunModel> for RunRow {
    fn from(run: &SyncRunModel) -> Self {
        Self {
            started: run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            vendor: run.vendor.clone(),
            status: run.status.to_string(),
            total: run.total_items,
            created: run.created_count,
            updated: run.updated_count,
            removed: run.removed_count,
            unchanged: run.unchanged_count,
            duration: run
                .duration_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
            actor: run.actor.clone(),
        }
    }
}

pub(crate) async fn handle_runs(
    vendor: Option<String>,
    status: Option<String>,
    since: Option<String>,
    until: Option<String>,
    limit: u64,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = status
        .map(|value| value.parse::<RunStatus>())
        .transpose()?;
    let since = since.map(|value| parse_instant(&value)).transpose()?;
    let until = until.map(|value| parse_instant(&value)).transpose()?;

    let db = connect_and_migrate(database_url).await?;
    let store = SqlCatalogStore::new(db);

    let page = store
        .list_runs(RunQuery {
            vendor,
            status,
            since,
            until,
            cursor: None,
            limit,
        })
        .await?;

    if page.runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }

    let rows: Vec<RunRow> = page.runs.iter().map(RunRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");

    // Failed runs get their error printed below the table.
    for run in page.runs.iter().filter(|run| run.status == RunStatus::Failed) {
        if let Some(error) = &run.error {
            println!(
                "{} {}: {}",
                style("error").red().bold(),
                run.id,
                error
            );
        }
    }

    if page.next_cursor.is_some() {
        println!("(more runs exist; raise --limit to see further back)");
    }

    Ok(())
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
