//! Time-decaying minimal-ROI table.
//!
//! Keys are minutes held, values are the minimum profit fraction that
//! triggers an exit once that holding time is reached. Lookup is "greatest
//! key <= elapsed minutes", so later entries can loosen the target as a
//! position ages. By construction the required profit is non-increasing
//! over time when the table is written that way; this module preserves the
//! lookup exactly and adds no smoothing.

use std::collections::BTreeMap;

/// True when the position's profit satisfies the ROI entry applicable at
/// `held_minutes`.
///
/// Before the smallest configured key nothing applies and the result is
/// false. A threshold of exactly `0.0` accepts any profit >= 0.
pub fn check_minimal_roi(table: &BTreeMap<u32, f64>, profit_pct: f64, held_minutes: i64) -> bool {
    if held_minutes < 0 {
        return false;
    }
    let elapsed = held_minutes.min(u32::MAX as i64) as u32;
    match table.range(..=elapsed).next_back() {
        Some((_, &required)) => profit_pct >= required,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(u32, f64)]) -> BTreeMap<u32, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn before_smallest_key_never_exits() {
        let roi = table(&[(30, 0.04), (60, 0.02), (120, 0.0)]);
        assert!(!check_minimal_roi(&roi, 0.50, 29));
        assert!(!check_minimal_roi(&roi, 0.50, 0));
    }

    #[test]
    fn greatest_key_at_or_below_elapsed_applies() {
        let roi = table(&[(30, 0.04), (60, 0.02), (120, 0.0)]);
        assert!(check_minimal_roi(&roi, 0.04, 30));
        assert!(!check_minimal_roi(&roi, 0.03, 45)); // still the 30-minute entry
        assert!(check_minimal_roi(&roi, 0.03, 60)); // 60-minute entry applies
        assert!(check_minimal_roi(&roi, 0.02, 119));
    }

    #[test]
    fn zero_threshold_accepts_any_nonnegative_profit() {
        let roi = table(&[(0, 0.0)]);
        assert!(check_minimal_roi(&roi, 0.0, 0));
        assert!(check_minimal_roi(&roi, 0.001, 5));
        assert!(!check_minimal_roi(&roi, -0.001, 5));
    }

    #[test]
    fn loosening_with_age() {
        let roi = table(&[(30, 0.04), (60, 0.02), (120, 0.0)]);
        // Same profit, older position: eventually exits.
        assert!(!check_minimal_roi(&roi, 0.01, 59));
        assert!(!check_minimal_roi(&roi, 0.01, 60));
        assert!(check_minimal_roi(&roi, 0.01, 120));
    }

    #[test]
    fn empty_table_never_exits() {
        assert!(!check_minimal_roi(&BTreeMap::new(), 1.0, 10_000));
    }

    #[test]
    fn negative_holding_time_never_exits() {
        let roi = table(&[(0, 0.0)]);
        assert!(!check_minimal_roi(&roi, 1.0, -1));
    }
}
