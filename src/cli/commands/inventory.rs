use crate::config::Config;
use crate::db::Store;

pub async fn cmd_inventory(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let items = store.list_inventory().await?;

    if items.is_empty() {
        println!("Inventory is empty.");
        return Ok(());
    }

    let summary = store.inventory_summary().await?;

    println!(
        "Inventory ({} items, {}/{} units available)",
        summary.items, summary.available_units, summary.total_units
    );
    println!("{:-<70}", "");

    for item in items {
        let indicator = if item.available == 0 { "✗" } else { "•" };
        println!(
            "{} {} [{}/{}]",
            indicator, item.name, item.available, item.quantity
        );
        println!(
            "  ID: {} | Category: {} | Condition: {}",
            item.id, item.category, item.condition
        );
        if let Some(notes) = &item.notes {
            println!("  Notes: {notes}");
        }
    }

    Ok(())
}
