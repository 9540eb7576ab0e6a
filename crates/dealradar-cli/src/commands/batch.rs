//! `dealradar batch <file>`: extract a list of URLs one after another.
//!
//! Calls are strictly serial with a random pause between them. Each record is
//! upserted into the store and price changes go to the alert sink.

use super::open_store;
use crate::output;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use dealradar::{
    record_sighting, ChromiumRenderer, DealExtractor, ExtractorConfig, LogAlertSink,
    ManualOverrides, ProductRecord, UpsertOutcome,
};
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// File with one product URL per line ('#' starts a comment)
    pub file: PathBuf,

    /// Minimum pause between extractions, in milliseconds
    #[arg(long, default_value = "1000")]
    pub delay_min_ms: u64,

    /// Maximum pause between extractions, in milliseconds
    #[arg(long, default_value = "2000")]
    pub delay_max_ms: u64,

    /// Database path (default: ~/.dealradar/dealradar.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    record: ProductRecord,
    outcome: UpsertOutcome,
}

#[derive(Debug, Default, Serialize, PartialEq)]
struct BatchSummary {
    total: usize,
    inserted: usize,
    price_changed: usize,
    needs_manual_price: usize,
}

impl BatchSummary {
    fn add(&mut self, record: &ProductRecord, outcome: &UpsertOutcome) {
        self.total += 1;
        if outcome.inserted {
            self.inserted += 1;
        }
        if outcome.price_changed {
            self.price_changed += 1;
        }
        if record.needs_manual_price() {
            self.needs_manual_price += 1;
        }
    }
}

/// URLs from a list file, skipping blank lines and comments.
fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect())
}

pub async fn run(args: BatchArgs, config: ExtractorConfig) -> Result<()> {
    if args.delay_min_ms > args.delay_max_ms {
        bail!(
            "--delay-min-ms ({}) must not exceed --delay-max-ms ({})",
            args.delay_min_ms,
            args.delay_max_ms
        );
    }

    let urls = read_url_list(&args.file)?;
    if urls.is_empty() {
        bail!("no URLs in {}", args.file.display());
    }

    let mut store = open_store(args.db.as_deref())?;
    let extractor = DealExtractor::new(ChromiumRenderer::new(config.clone()), config);
    let manual = ManualOverrides::default();

    let mut entries = Vec::with_capacity(urls.len());
    let mut summary = BatchSummary::default();

    for (i, url) in urls.iter().enumerate() {
        if i > 0 {
            let pause = rand::thread_rng().gen_range(args.delay_min_ms..=args.delay_max_ms);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }

        info!(url = %url, index = i + 1, total = urls.len(), "extracting");
        let record = extractor.extract(url, &manual).await;
        let outcome = record_sighting(&mut store, &LogAlertSink, &record, Utc::now())
            .with_context(|| format!("failed to store {url}"))?;

        summary.add(&record, &outcome);
        if !output::is_json() && !output::is_quiet() {
            println!(
                "  [{}/{}] {} | {} ({})",
                i + 1,
                urls.len(),
                record.title,
                output::format_price_line(&record),
                record.real_deal_status
            );
        }
        entries.push(BatchEntry { record, outcome });
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "summary": summary,
            "results": entries,
        }));
    } else {
        println!();
        println!(
            "  {} extracted, {} new, {} price changes, {} need a manual price",
            summary.total, summary.inserted, summary.price_changed, summary.needs_manual_price
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_url_list_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# watchlist").unwrap();
        writeln!(file, "https://www.trendyol.com/a-p-1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   https://www.n11.com/urun/b-2  ").unwrap();

        let urls = read_url_list(file.path()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.trendyol.com/a-p-1".to_string(),
                "https://www.n11.com/urun/b-2".to_string()
            ]
        );
    }

    #[test]
    fn test_read_url_list_missing_file() {
        assert!(read_url_list(Path::new("/definitely/missing/urls.txt")).is_err());
    }

    #[test]
    fn test_summary_counts() {
        let priced = ProductRecord {
            current_price: 64.99,
            original_price: 89.99,
            ..ProductRecord::placeholder("https://www.trendyol.com/a-p-1")
        };
        let unknown = ProductRecord::placeholder("https://www.trendyol.com/b-p-2");
        let mut summary = BatchSummary::default();
        summary.add(
            &priced,
            &UpsertOutcome {
                product_id: 1,
                inserted: true,
                price_changed: false,
                previous_price: None,
            },
        );
        summary.add(
            &unknown,
            &UpsertOutcome {
                product_id: 2,
                inserted: false,
                price_changed: false,
                previous_price: Some(10.0),
            },
        );
        assert_eq!(
            summary,
            BatchSummary {
                total: 2,
                inserted: 1,
                price_changed: 0,
                needs_manual_price: 1,
            }
        );
    }
}
