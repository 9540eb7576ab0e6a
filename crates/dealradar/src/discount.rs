//! Discount percentage and real-deal classification.

use crate::config::DealThresholds;
use crate::types::DealStatus;

/// `floor((original - current) / original * 100)`, or `0` when there is no
/// discount or either price is unknown.
///
/// Computed over whole cents so that values such as `80 / 100` land on the
/// exact integer rather than one below it.
pub fn discount_percent(current: f64, original: f64) -> u8 {
    if !(current.is_finite() && original.is_finite()) || current <= 0.0 || original <= current {
        return 0;
    }
    // Float-to-int casts saturate, so absurd prices cannot wrap.
    let current_cents = (current * 100.0).round() as u128;
    let original_cents = (original * 100.0).round() as u128;
    if original_cents == 0 || original_cents <= current_cents {
        return 0;
    }
    let saved = original_cents - current_cents;
    let pct = match saved.checked_mul(100) {
        Some(scaled) => scaled / original_cents,
        None => saved / (original_cents / 100),
    };
    pct.min(100) as u8
}

/// Label a discount. A pure function of the percentage and thresholds.
pub fn classify_deal(discount_percent: u8, thresholds: &DealThresholds) -> DealStatus {
    if discount_percent >= thresholds.real_cut {
        DealStatus::Real
    } else if discount_percent >= thresholds.normal_cut {
        DealStatus::Normal
    } else {
        thresholds.low_end_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_percent_floors() {
        assert_eq!(discount_percent(64.99, 89.99), 27);
        assert_eq!(discount_percent(199.0, 299.0), 33);
        assert_eq!(discount_percent(80.0, 100.0), 20);
        assert_eq!(discount_percent(70.0, 100.0), 30);
        assert_eq!(discount_percent(99.99, 100.0), 0);
    }

    #[test]
    fn test_discount_percent_zero_cases() {
        assert_eq!(discount_percent(899.90, 899.90), 0);
        assert_eq!(discount_percent(0.0, 0.0), 0);
        assert_eq!(discount_percent(0.0, 100.0), 0);
        assert_eq!(discount_percent(120.0, 100.0), 0);
        assert_eq!(discount_percent(f64::NAN, 100.0), 0);
    }

    #[test]
    fn test_discount_percent_huge_original() {
        assert_eq!(discount_percent(1.0, 1e16), 99);
        assert_eq!(discount_percent(199.0, 2e15), 99);
        assert!(discount_percent(199.0, f64::MAX) <= 100);
        assert_eq!(discount_percent(f64::MAX, f64::MAX), 0);
    }

    #[test]
    fn test_classify_deal_thresholds() {
        let t = DealThresholds::default();
        assert_eq!(classify_deal(100, &t), DealStatus::Real);
        assert_eq!(classify_deal(20, &t), DealStatus::Real);
        assert_eq!(classify_deal(19, &t), DealStatus::Normal);
        assert_eq!(classify_deal(10, &t), DealStatus::Normal);
        assert_eq!(classify_deal(9, &t), DealStatus::Normal);
        assert_eq!(classify_deal(0, &t), DealStatus::Normal);
    }

    #[test]
    fn test_classify_deal_low_end_configurable() {
        let t = DealThresholds {
            low_end_status: DealStatus::Fake,
            ..DealThresholds::default()
        };
        assert_eq!(classify_deal(9, &t), DealStatus::Fake);
        assert_eq!(classify_deal(10, &t), DealStatus::Normal);
    }

    #[test]
    fn test_classify_deal_is_deterministic() {
        let t = DealThresholds::default();
        for pct in 0..=100u8 {
            assert_eq!(classify_deal(pct, &t), classify_deal(pct, &t));
        }
    }
}
