//! `dealradar history <url>`: stored price observations of one product.

use super::open_store;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use dealradar::ProductStore;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Product page URL as it was extracted
    pub url: String,

    /// Database path (default: ~/.dealradar/dealradar.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub fn run(args: HistoryArgs) -> Result<()> {
    let store = open_store(args.db.as_deref())?;
    let product = store
        .find_by_url(&args.url)?
        .with_context(|| format!("no stored product for {}", args.url))?;
    let history = store.price_history(product.id)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "product": product,
            "history": history,
        }));
        return Ok(());
    }

    println!("  {} (#{})", product.record.title, product.id);
    println!("  {}", product.record.product_url);
    println!();
    for observation in &history {
        println!(
            "  {}  {:>12}",
            observation.observed_at.format("%Y-%m-%d %H:%M"),
            output::format_price(observation.price)
        );
    }
    if history.is_empty() {
        println!("  (no observations)");
    }
    Ok(())
}
