//! `dealradar extract <url>`: extract one product page.

use super::{open_store, parse_price_arg};
use crate::output;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use dealradar::{
    record_sighting, ChromiumRenderer, DealExtractor, ExtractorConfig, LogAlertSink,
    ManualOverrides, ProductRecord, StaticRenderer,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Product page URL
    pub url: String,

    /// Manual current price; takes precedence over the page
    #[arg(long, value_parser = parse_price_arg)]
    pub price: Option<f64>,

    /// Manual original (strike-through) price
    #[arg(long, value_parser = parse_price_arg)]
    pub old_price: Option<f64>,

    /// Manual discount percentage; overrides the computed one
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub discount: Option<u8>,

    /// Extract from a saved HTML file instead of launching a browser
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Store the record and its price observation
    #[arg(long)]
    pub save: bool,

    /// Database path (default: ~/.dealradar/dealradar.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

impl ExtractArgs {
    fn manual(&self) -> ManualOverrides {
        ManualOverrides {
            current_price: self.price,
            original_price: self.old_price,
            discount_percent: self.discount,
        }
    }
}

pub async fn run(args: ExtractArgs, config: ExtractorConfig) -> Result<()> {
    let manual = args.manual();

    let record = match &args.html {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let renderer = StaticRenderer::new().with_html(&args.url, html);
            DealExtractor::new(renderer, config)
                .extract(&args.url, &manual)
                .await
        }
        None => {
            let renderer = ChromiumRenderer::new(config.clone());
            DealExtractor::new(renderer, config)
                .extract(&args.url, &manual)
                .await
        }
    };

    let saved = if args.save {
        let mut store = open_store(args.db.as_deref())?;
        Some(record_sighting(&mut store, &LogAlertSink, &record, Utc::now())?)
    } else {
        None
    };

    report(&record, saved.as_ref());
    Ok(())
}

fn report(record: &ProductRecord, saved: Option<&dealradar::UpsertOutcome>) {
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "record": record,
            "needs_manual_price": record.needs_manual_price(),
            "saved": saved,
        }));
    } else {
        output::print_record(record, saved);
    }
}
