//! Last-known-good state display.

use console::style;

use stockist::store::CatalogStore;
use stockist::{SqlCatalogStore, connect_and_migrate};

pub(crate) async fn handle_state(
    vendor: &str,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect_and_migrate(database_url).await?;
    let store = SqlCatalogStore::new(db);

    let Some(state) = store.get_state(vendor).await? else {
        println!("Vendor {} has never successfully synced.", style(vendor).bold());
        return Ok(());
    };

    println!("{}", style(&state.vendor).bold());
    println!("  last run    {}", state.last_run_at.format("%Y-%m-%d %H:%M:%S %Z"));
    println!("  duration    {}ms", state.last_duration_ms);
    println!("  items       {}", state.total_items);
    println!("  hash        {}", state.last_hash);
    println!("  source      {}", state.last_source);
    println!("  actor       {}", state.last_actor);
    match &state.last_error {
        Some(error) => println!("  last error  {}", style(error).red()),
        None => println!("  last error  {}", style("none").green()),
    }

    Ok(())
}
