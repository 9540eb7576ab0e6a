//! Output mode flags and shared printing helpers.

use dealradar::{ProductRecord, UpsertOutcome};
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFlags {
    pub json: bool,
    pub quiet: bool,
}

static FLAGS: OnceLock<OutputFlags> = OnceLock::new();

/// Record the global flags. Later calls are ignored.
pub fn init(flags: OutputFlags) {
    let _ = FLAGS.set(flags);
}

pub fn is_json() -> bool {
    FLAGS.get().map(|f| f.json).unwrap_or(false)
}

pub fn is_quiet() -> bool {
    FLAGS.get().map(|f| f.quiet).unwrap_or(false)
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

pub fn format_price(value: f64) -> String {
    format!("{value:.2}")
}

/// `64.99 (was 89.99, -27%)`, or `unknown` when no price was found.
pub fn format_price_line(record: &ProductRecord) -> String {
    if record.needs_manual_price() {
        return "unknown".to_string();
    }
    if record.original_price > record.current_price {
        format!(
            "{} (was {}, -{}%)",
            format_price(record.current_price),
            format_price(record.original_price),
            record.discount_percent
        )
    } else {
        format_price(record.current_price)
    }
}

/// Human-readable block for one record.
pub fn print_record(record: &ProductRecord, saved: Option<&UpsertOutcome>) {
    println!("  Title:     {}", record.title);
    println!("  Platform:  {}", record.platform);
    println!("  Category:  {}", record.category);
    println!("  Price:     {}", format_price_line(record));
    println!("  Status:    {}", record.real_deal_status);
    if !record.image_url.is_empty() {
        println!("  Image:     {}", record.image_url);
    }
    println!("  URL:       {}", record.product_url);
    if let Some(outcome) = saved {
        let what = if outcome.inserted {
            "new product"
        } else if outcome.price_changed {
            "price changed"
        } else {
            "unchanged"
        };
        println!("  Saved:     #{} ({what})", outcome.product_id);
    }
    if record.needs_manual_price() && !is_quiet() {
        println!();
        println!("  No price found on the page. Supply one with --price / --old-price.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(current: f64, original: f64, pct: u8) -> ProductRecord {
        ProductRecord {
            current_price: current,
            original_price: original,
            discount_percent: pct,
            ..ProductRecord::placeholder("https://www.trendyol.com/x-p-1")
        }
    }

    #[test]
    fn test_format_price_line() {
        assert_eq!(format_price_line(&record(64.99, 89.99, 27)), "64.99 (was 89.99, -27%)");
        assert_eq!(format_price_line(&record(899.9, 899.9, 0)), "899.90");
        assert_eq!(format_price_line(&record(0.0, 0.0, 0)), "unknown");
    }
}
