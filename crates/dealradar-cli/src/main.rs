// Copyright 2026 DealRadar Contributors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dealradar::ExtractorConfig;
use std::path::PathBuf;

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "dealradar",
    about = "DealRadar - extract prices and discounts from retailer product pages",
    version,
    after_help = "Run 'dealradar <command> --help' for details on each command.\nTunables can also be set with DEALRADAR_* environment variables."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Only log warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(flatten)]
    tuning: TuningArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags that override `DEALRADAR_*` environment settings.
#[derive(Args, Debug, Default)]
struct TuningArgs {
    /// Minimum plausible product price
    #[arg(long, global = true)]
    price_floor: Option<f64>,

    /// Wait after navigation before snapshotting, in milliseconds
    #[arg(long, global = true)]
    settle_ms: Option<u64>,

    /// Path to a Chromium or Chrome binary
    #[arg(long, global = true)]
    chromium_path: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headful: bool,
}

impl TuningArgs {
    fn apply(&self, config: &mut ExtractorConfig) {
        if let Some(floor) = self.price_floor {
            config.price_floor = floor;
        }
        if let Some(ms) = self.settle_ms {
            config.settle_ms = ms;
        }
        if let Some(path) = &self.chromium_path {
            config.chromium_path = Some(path.clone());
        }
        if self.headful {
            config.headless = false;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one product page and print the record
    Extract(commands::extract::ExtractArgs),
    /// Extract every URL in a file and store the results
    Batch(commands::batch::BatchArgs),
    /// Show the stored price history of a product
    History(commands::history::HistoryArgs),
    /// Check environment and show effective configuration
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("dealradar=debug")
    } else if quiet {
        EnvFilter::new("dealradar=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dealradar=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    output::init(output::OutputFlags {
        json: cli.json,
        quiet: cli.quiet,
    });
    init_tracing(cli.verbose, cli.quiet);

    let mut config = ExtractorConfig::from_env();
    cli.tuning.apply(&mut config);

    let result = match cli.command {
        Commands::Extract(args) => commands::extract::run(args, config).await,
        Commands::Batch(args) => commands::batch::run(args, config).await,
        Commands::History(args) => commands::history::run(args),
        Commands::Doctor => commands::doctor::run(&config),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dealradar", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_tuning_flags_override_config() {
        let cli = Cli::parse_from([
            "dealradar",
            "--price-floor",
            "25",
            "--headful",
            "doctor",
        ]);
        let mut config = ExtractorConfig::default();
        cli.tuning.apply(&mut config);
        assert_eq!(config.price_floor, 25.0);
        assert!(!config.headless);
        assert_eq!(config.settle_ms, ExtractorConfig::default().settle_ms);
    }

    #[test]
    fn test_extract_args_parse() {
        let cli = Cli::parse_from([
            "dealradar",
            "--json",
            "extract",
            "https://www.trendyol.com/x-p-1",
            "--price",
            "1.299,90",
            "--old-price",
            "1599",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.price, Some(1299.90));
                assert_eq!(args.old_price, Some(1599.0));
                assert_eq!(args.discount, None);
            }
            _ => panic!("expected extract"),
        }
    }
}
