//! Environment readiness check.

use super::db_path;
use crate::output;
use anyhow::Result;
use dealradar::{find_chromium, ExtractorConfig};

/// Report Chromium discovery, the database location and effective tunables.
pub fn run(config: &ExtractorConfig) -> Result<()> {
    let chromium = find_chromium(config.chromium_path.as_deref());
    let db = db_path(None);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium,
            "database": db,
            "database_exists": db.exists(),
            "config": config,
            "ready": chromium.is_some(),
        }));
        return Ok(());
    }

    println!("DealRadar Doctor");
    println!("================");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set DEALRADAR_CHROMIUM_PATH."
        ),
    }
    if db.exists() {
        println!("[OK] Database: {}", db.display());
    } else {
        println!("[--] Database will be created at {}", db.display());
    }

    println!();
    println!("Price floor:      {}", config.price_floor);
    println!(
        "Deal tiers:       real >= {}%, normal >= {}%, below: {}",
        config.thresholds.real_cut, config.thresholds.normal_cut, config.thresholds.low_end_status
    );
    println!("Settle interval:  {}ms", config.settle_ms);
    println!("Nav timeout:      {}ms", config.navigation_timeout_ms);
    println!(
        "Viewport:         {}x{}{}",
        config.viewport.width,
        config.viewport.height,
        if config.headless { "" } else { " (headful)" }
    );
    println!("User agent:       {}", config.user_agent);

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY (only `extract --html` works)");
    }

    Ok(())
}
