//! Vendor registry commands.

use console::style;
use stockist::repository;
use stockist::{IntegrationKind, connect_and_migrate};

use crate::VendorAction;

pub(crate) async fn handle_vendor(
    action: VendorAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect_and_migrate(database_url).await?;

    match action {
        VendorAction::Add {
            slug,
            name,
            integration,
        } => {
            let kind = integration
                .map(|value| value.parse::<IntegrationKind>())
                .transpose()?;

            let vendor = repository::insert_vendor(&db, &slug, &name, kind).await?;
            println!(
                "Registered {} ({}) with integration: {}",
                style(&vendor.slug).green().bold(),
                vendor.name,
                vendor
                    .integration
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
        }
        VendorAction::List => {
            let vendors = repository::list_vendors(&db).await?;
            if vendors.is_empty() {
                println!("No vendors registered. Add one with: stockist vendor add <slug> <name>");
                return Ok(());
            }
            for vendor in vendors {
                let integration = vendor
                    .integration
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "none".to_string());
                println!(
                    "{:<20} {:<30} {}",
                    style(&vendor.slug).bold(),
                    vendor.name,
                    integration
                );
            }
        }
    }

    Ok(())
}
