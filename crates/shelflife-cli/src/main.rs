//! CLI application for reading expiry dates off food labels.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{alerts, batch, config, inventory, scan, text};

/// Smart expiry alerts - read expiry dates from label photos and track perishables
#[derive(Parser)]
#[command(name = "shelflife")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the expiry date from a label photo
    Scan(scan::ScanArgs),

    /// Read expiry dates from many label photos
    Batch(batch::BatchArgs),

    /// Extract the expiry date from already recognized text
    Text(text::TextArgs),

    /// Manage tracked items
    Inventory(inventory::InventoryArgs),

    /// Send alerts for items about to expire
    Alerts(alerts::AlertsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Scan(args) => scan::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Text(args) => text::run(args, config_path).await,
        Commands::Inventory(args) => inventory::run(args, config_path).await,
        Commands::Alerts(args) => alerts::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
