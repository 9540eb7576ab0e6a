//! Subcommand implementations for the `dealradar` binary.

pub mod batch;
pub mod doctor;
pub mod extract;
pub mod history;

use anyhow::{Context, Result};
use dealradar::SqliteStore;
use std::path::{Path, PathBuf};

/// Database location: explicit flag, then `DEALRADAR_DB`, then the default.
pub fn db_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("DEALRADAR_DB").map(PathBuf::from))
        .unwrap_or_else(SqliteStore::default_path)
}

pub fn open_store(explicit: Option<&Path>) -> Result<SqliteStore> {
    let path = db_path(explicit);
    SqliteStore::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

/// Parse a price argument in either `1299.90` or `1.299,90` form.
pub fn parse_price_arg(raw: &str) -> Result<f64, String> {
    dealradar::normalize::parse_machine_price(raw)
        .ok_or_else(|| format!("'{raw}' is not a valid price"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_arg() {
        assert_eq!(parse_price_arg("199"), Ok(199.0));
        assert_eq!(parse_price_arg("1.299,90"), Ok(1299.90));
        assert!(parse_price_arg("abc").is_err());
        assert!(parse_price_arg("-5").is_err());
    }

    #[test]
    fn test_db_path_prefers_explicit() {
        let p = Path::new("/tmp/deals.db");
        assert_eq!(db_path(Some(p)), PathBuf::from("/tmp/deals.db"));
    }
}
