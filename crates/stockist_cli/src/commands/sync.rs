//! The sync command: dry run by default, `--apply` to write.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use stockist::sync::RawCatalogItem;
use stockist::{
    SqlCatalogStore, SyncEngine, SyncOptions, SyncSummary, connect_and_migrate,
};

use crate::config::Config;

pub(crate) struct SyncArgs {
    pub(crate) vendor: String,
    pub(crate) apply: bool,
    pub(crate) source: Option<PathBuf>,
    pub(crate) actor: Option<String>,
    pub(crate) inject: Option<PathBuf>,
    pub(crate) json: bool,
}

pub(crate) async fn handle_sync(
    args: SyncArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let inject = args
        .inject
        .map(|path| -> Result<Vec<RawCatalogItem>, Box<dyn std::error::Error>> {
            let text = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&text)?)
        })
        .transpose()?;

    let db = connect_and_migrate(database_url).await?;
    let engine = SyncEngine::new(Arc::new(SqlCatalogStore::new(db)));

    let options = SyncOptions {
        dry_run: !args.apply,
        source: args.source,
        actor: args.actor.unwrap_or_else(|| config.sync.actor.clone()),
        inject,
        apply_timeout: Duration::from_secs(config.sync.apply_timeout_secs),
    };

    let summary = engine.sync(&args.vendor, options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &SyncSummary) {
    let mode = if summary.dry_run {
        style("dry run").yellow().to_string()
    } else {
        style("applied").green().to_string()
    };

    println!(
        "{} {} ({})",
        style(&summary.vendor).bold(),
        mode,
        summary
            .source
            .as_deref()
            .unwrap_or("no source")
    );
    println!(
        "  total {} | created {} | updated {} | unchanged {} | removed {}",
        summary.total,
        style(summary.created).green(),
        style(summary.updated).yellow(),
        summary.unchanged,
        style(summary.removed).red(),
    );
    println!(
        "  hash {} | {}ms",
        &summary.hash[..summary.hash.len().min(12)],
        summary.duration_ms
    );
    if let Some(run_id) = summary.run_id {
        println!("  run {}", run_id);
    }
}
