//! Alerts command - notify about items nearing expiry.

use clap::Args;
use console::style;
use tracing::info;

use shelflife_core::{
    build_alerts, AlertDigest, InventoryStore, ItemStatus, LogNotifier, Notifier, OutboxNotifier,
};

use super::{load_config, open_store, today};

/// Arguments for the alerts command.
#[derive(Args)]
pub struct AlertsArgs {
    /// Alert on items expiring within this many days (default from config)
    #[arg(short, long)]
    days: Option<i64>,

    /// Print the digest instead of sending it
    #[arg(long)]
    dry_run: bool,
}

pub async fn run(args: AlertsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let alert_days = args.days.unwrap_or(config.alerts.alert_days);

    let store = open_store(&config)?;
    let items = store.list(Some(ItemStatus::Active))?;
    let digest = AlertDigest::new(build_alerts(&items, today(), alert_days));

    if digest.is_empty() {
        println!(
            "{} No active items expire within {} days.",
            style("ℹ").blue(),
            alert_days
        );
        return Ok(());
    }

    if args.dry_run {
        println!("Subject: {}\n", digest.subject());
        println!("{}", digest.body());
        return Ok(());
    }

    let notifier: Box<dyn Notifier> = if config.alerts.outbox_dir.is_some() {
        Box::new(OutboxNotifier::from_config(&config.alerts)?)
    } else {
        info!("alerts.outbox_dir not set, logging the digest instead");
        Box::new(LogNotifier)
    };

    digest.send(notifier.as_ref())?;
    println!(
        "{} Sent alert for {} items",
        style("✓").green(),
        digest.alerts().len()
    );
    Ok(())
}
