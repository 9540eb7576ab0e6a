//! Extractor configuration: tunable thresholds and browser settings.
//!
//! Values start from [`ExtractorConfig::default`] and may be overridden from
//! the environment with [`ExtractorConfig::from_env`]:
//!
//! - `DEALRADAR_PRICE_FLOOR`: minimum plausible product price
//! - `DEALRADAR_REAL_DEAL_CUT` / `DEALRADAR_NORMAL_CUT`: discount tiers
//! - `DEALRADAR_LOW_END_STATUS`: label below the normal cut (`normal`/`fake`)
//! - `DEALRADAR_SETTLE_MS`: wait after navigation before snapshotting
//! - `DEALRADAR_NAV_TIMEOUT_MS`: navigation budget
//! - `DEALRADAR_USER_AGENT`: masquerading browser identity
//! - `DEALRADAR_CHROMIUM_PATH`: explicit browser binary
//! - `DEALRADAR_HEADFUL=1`: show the browser window

use crate::types::DealStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default minimum plausible price. Installment and shipping amounts sit below it.
pub const DEFAULT_PRICE_FLOOR: f64 = 15.0;

/// Default discount percentage at which a deal is labelled `real`.
pub const DEFAULT_REAL_DEAL_CUT: u8 = 20;

/// Default discount percentage at which a deal is labelled `normal`.
pub const DEFAULT_NORMAL_CUT: u8 = 10;

/// Desktop Chrome identity presented to retailers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) \
    Chrome/131.0.0.0 Safari/537.36";

/// Thresholds for the real-deal classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealThresholds {
    /// `discount >= real_cut` → `real`.
    pub real_cut: u8,
    /// `normal_cut <= discount < real_cut` → `normal`.
    pub normal_cut: u8,
    /// Label for `discount < normal_cut`.
    pub low_end_status: DealStatus,
}

impl Default for DealThresholds {
    fn default() -> Self {
        Self {
            real_cut: DEFAULT_REAL_DEAL_CUT,
            normal_cut: DEFAULT_NORMAL_CUT,
            low_end_status: DealStatus::Normal,
        }
    }
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// All tunables of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub price_floor: f64,
    pub thresholds: DealThresholds,
    pub settle_ms: u64,
    pub navigation_timeout_ms: u64,
    pub user_agent: String,
    pub viewport: ViewportSize,
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            price_floor: DEFAULT_PRICE_FLOOR,
            thresholds: DealThresholds::default(),
            settle_ms: 3000,
            navigation_timeout_ms: 30_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: ViewportSize::default(),
            chromium_path: None,
            headless: true,
        }
    }
}

impl ExtractorConfig {
    /// Defaults with any `DEALRADAR_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from an arbitrary key lookup. Unparsable values are
    /// ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var::<f64>(&lookup, "DEALRADAR_PRICE_FLOOR") {
            if v.is_finite() && v >= 0.0 {
                self.price_floor = v;
            } else {
                tracing::warn!("ignoring DEALRADAR_PRICE_FLOOR={v}: must be a finite non-negative number");
            }
        }
        if let Some(v) = parse_var::<u8>(&lookup, "DEALRADAR_REAL_DEAL_CUT") {
            self.thresholds.real_cut = v.min(100);
        }
        if let Some(v) = parse_var::<u8>(&lookup, "DEALRADAR_NORMAL_CUT") {
            self.thresholds.normal_cut = v.min(100);
        }
        if let Some(raw) = lookup("DEALRADAR_LOW_END_STATUS") {
            match DealStatus::from_name(&raw) {
                Some(status) if status != DealStatus::Real => {
                    self.thresholds.low_end_status = status
                }
                _ => tracing::warn!("ignoring DEALRADAR_LOW_END_STATUS={raw}: expected normal or fake"),
            }
        }
        if let Some(v) = parse_var::<u64>(&lookup, "DEALRADAR_SETTLE_MS") {
            self.settle_ms = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, "DEALRADAR_NAV_TIMEOUT_MS") {
            self.navigation_timeout_ms = v;
        }
        if let Some(ua) = lookup("DEALRADAR_USER_AGENT") {
            if !ua.trim().is_empty() {
                self.user_agent = ua;
            }
        }
        if let Some(p) = lookup("DEALRADAR_CHROMIUM_PATH") {
            if !p.trim().is_empty() {
                self.chromium_path = Some(PathBuf::from(p));
            }
        }
        if let Some(v) = lookup("DEALRADAR_HEADFUL") {
            self.headless = !matches!(v.as_str(), "1" | "true" | "yes");
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {key}={raw}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = ExtractorConfig::default();
        assert_eq!(c.price_floor, 15.0);
        assert_eq!(c.thresholds.real_cut, 20);
        assert_eq!(c.thresholds.normal_cut, 10);
        assert_eq!(c.thresholds.low_end_status, DealStatus::Normal);
        assert_eq!(c.viewport, ViewportSize { width: 1920, height: 1080 });
        assert!(c.headless);
        assert!(c.user_agent.contains("Chrome/"));
    }

    #[test]
    fn test_overrides_applied() {
        let mut c = ExtractorConfig::default();
        c.apply_overrides(lookup_from(&[
            ("DEALRADAR_PRICE_FLOOR", "25"),
            ("DEALRADAR_REAL_DEAL_CUT", "30"),
            ("DEALRADAR_LOW_END_STATUS", "fake"),
            ("DEALRADAR_SETTLE_MS", "500"),
            ("DEALRADAR_CHROMIUM_PATH", "/opt/chrome/chrome"),
            ("DEALRADAR_HEADFUL", "1"),
        ]));
        assert_eq!(c.price_floor, 25.0);
        assert_eq!(c.thresholds.real_cut, 30);
        assert_eq!(c.thresholds.low_end_status, DealStatus::Fake);
        assert_eq!(c.settle_ms, 500);
        assert_eq!(c.chromium_path, Some(PathBuf::from("/opt/chrome/chrome")));
        assert!(!c.headless);
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut c = ExtractorConfig::default();
        c.apply_overrides(lookup_from(&[
            ("DEALRADAR_PRICE_FLOOR", "cheap"),
            ("DEALRADAR_REAL_DEAL_CUT", "-4"),
            ("DEALRADAR_LOW_END_STATUS", "real"),
            ("DEALRADAR_PRICE_FLOOR_UNUSED", "1"),
        ]));
        assert_eq!(c, ExtractorConfig::default());
    }

    #[test]
    fn test_negative_floor_rejected() {
        let mut c = ExtractorConfig::default();
        c.apply_overrides(lookup_from(&[("DEALRADAR_PRICE_FLOOR", "-1")]));
        assert_eq!(c.price_floor, DEFAULT_PRICE_FLOOR);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let c: ExtractorConfig = serde_json::from_str(r#"{"price_floor": 10.0}"#).unwrap();
        assert_eq!(c.price_floor, 10.0);
        assert_eq!(c.settle_ms, 3000);
    }
}
