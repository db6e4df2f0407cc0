//! Text command - extract the expiry date from already recognized text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;

use shelflife_core::ExpiryParser;

use super::load_config;
use super::scan::{write_output, OutputFormat, ScanReport};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Text file, or `-` for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also list every scored date candidate
    #[arg(long)]
    show_candidates: bool,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = if args.input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&args.input)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", args.input, e))?
    };

    let parser = ExpiryParser::with_config(&config.extraction);
    let result = parser.parse_str(&text);
    let found = result.is_found();

    let report = ScanReport::new(result, args.show_candidates.then_some(&parser));
    write_output(&report.render(args.format)?, args.output.as_ref())?;

    if !found {
        eprintln!("{} No expiry date found in the text.", style("!").yellow());
    }
    Ok(())
}
