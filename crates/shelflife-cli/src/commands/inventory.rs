//! Inventory command - add, list and update tracked items.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;

use shelflife_core::inventory::days_until;
use shelflife_core::{
    expire_overdue, InventoryItem, InventoryStore, ItemStatus, NewItem, RiskFeatures, RiskScorer,
    RuleBasedScorer, ShelfConfig,
};

use super::{load_config, open_store, parse_user_date, read_label, today};

/// Arguments for the inventory command.
#[derive(Args)]
pub struct InventoryArgs {
    #[command(subcommand)]
    command: InventoryCommand,
}

#[derive(Subcommand)]
enum InventoryCommand {
    /// Add an item
    Add(AddArgs),

    /// List items
    List {
        /// Only items with this status (active, consumed, expired)
        #[arg(short, long)]
        status: Option<ItemStatus>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Mark an item consumed
    Consume {
        /// Item id
        id: u64,
    },

    /// Set an item's status
    Status {
        /// Item id
        id: u64,
        /// New status (active, consumed, expired)
        status: ItemStatus,
    },

    /// Delete an item
    Delete {
        /// Item id
        id: u64,
    },
}

#[derive(Args)]
struct AddArgs {
    /// Product name
    name: String,

    /// Expiry date (YYYY-MM-DD or as printed on labels)
    #[arg(short, long)]
    expiry: Option<String>,

    /// Label photo to read the expiry date from
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Number of units
    #[arg(short, long, default_value = "1")]
    quantity: u32,
}

pub async fn run(args: InventoryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        InventoryCommand::Add(add) => add_item(add, &config).await,
        InventoryCommand::List { status, json } => list_items(status, json, &config),
        InventoryCommand::Consume { id } => set_status(id, ItemStatus::Consumed, &config),
        InventoryCommand::Status { id, status } => set_status(id, status, &config),
        InventoryCommand::Delete { id } => {
            let mut store = open_store(&config)?;
            store.delete(id)?;
            println!("{} Deleted item {}", style("✓").green(), id);
            Ok(())
        }
    }
}

async fn add_item(args: AddArgs, config: &ShelfConfig) -> anyhow::Result<()> {
    let today = today();
    let expiry = resolve_expiry(&args, config).await?;

    if expiry < today {
        anyhow::bail!("Expiry date {} is in the past. It must be today or later.", expiry);
    }

    let features = RiskFeatures::for_item(&args.name, expiry, args.quantity, today);
    let risk_score = RuleBasedScorer::default().score(&features);

    let mut item = NewItem::new(&args.name, expiry)
        .with_quantity(args.quantity)
        .with_risk_score(risk_score);
    if let Some(image) = &args.image {
        item = item.with_image_path(image);
    }

    let mut store = open_store(config)?;
    let created = store.create(item)?;

    println!(
        "{} Added #{} {} (expires {}, risk {:.2})",
        style("✓").green(),
        created.id,
        created.name,
        created.expiry_date,
        created.risk_score
    );
    Ok(())
}

/// Explicit `--expiry` wins; otherwise read it off `--image`.
async fn resolve_expiry(args: &AddArgs, config: &ShelfConfig) -> anyhow::Result<NaiveDate> {
    if let Some(expiry) = &args.expiry {
        return parse_user_date(expiry);
    }

    let Some(image) = &args.image else {
        anyhow::bail!("Give an expiry date with --expiry or a label photo with --image");
    };

    let result = read_label(image, config)
        .await
        .map_err(|e| anyhow::anyhow!("Could not read text from {}: {}", image.display(), e))?;

    match result.expiry_date {
        Some(date) => {
            println!("{} Detected expiry: {}", style("ℹ").blue(), date);
            Ok(date)
        }
        None => anyhow::bail!(
            "Could not detect an expiry date on {}. Pass it with --expiry.",
            image.display()
        ),
    }
}

fn list_items(status: Option<ItemStatus>, json: bool, config: &ShelfConfig) -> anyhow::Result<()> {
    let today = today();
    let mut store = open_store(config)?;
    expire_overdue(&mut store, today)?;

    let items = store.list(status)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("{} No items yet. Add some with 'shelflife inventory add'.", style("ℹ").blue());
        return Ok(());
    }

    println!(
        "{:>4}  {:<30} {:<10} {:>9} {:>4} {:>5}  {}",
        "ID", "Name", "Expiry", "Days Left", "Qty", "Risk", "Status"
    );
    for item in &items {
        println!("{}", format_row(item, today));
    }
    Ok(())
}

fn format_row(item: &InventoryItem, today: NaiveDate) -> String {
    let days_left = days_until(item.expiry_date, today);
    let name: String = item.name.chars().take(30).collect();
    let row = format!(
        "{:>4}  {:<30} {:<10} {:>9} {:>4} {:>5.2}  {}",
        item.id, name, item.expiry_date, days_left, item.quantity, item.risk_score, item.status
    );

    if item.status == ItemStatus::Expired || days_left <= 0 {
        style(row).red().to_string()
    } else if days_left <= 3 {
        style(row).yellow().to_string()
    } else {
        row
    }
}

fn set_status(id: u64, status: ItemStatus, config: &ShelfConfig) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let item = store.update_status(id, status)?;
    println!(
        "{} Marked #{} {} as {}",
        style("✓").green(),
        item.id,
        item.name,
        item.status
    );
    Ok(())
}
