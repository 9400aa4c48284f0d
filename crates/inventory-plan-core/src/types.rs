use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock and flow quantities. Wraps Decimal to prevent accidental f64 usage.
pub type Units = Decimal;

/// Percentages expressed in percent (12.5 = 12.5%), not as fractions.
pub type Percent = Decimal;

/// Weeks of inventory coverage
pub type Weeks = Decimal;

/// Number of calendar months in every series.
pub const MONTHS: usize = 12;

/// One value per calendar month, index 0 = January.
pub type MonthlySeries = [Units; MONTHS];

/// An all-zero monthly series.
pub const ZERO_SERIES: MonthlySeries = [Decimal::ZERO; MONTHS];

/// Annual total of a monthly series, saturating at the decimal range.
pub fn series_total(series: &MonthlySeries) -> Units {
    series
        .iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
}

/// Annual total, or `None` when it does not fit in a `Decimal`.
pub fn checked_series_total(series: &MonthlySeries) -> Option<Units> {
    series
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}

/// Month-wise sum of two series, saturating at the decimal range.
pub fn add_series(a: &MonthlySeries, b: &MonthlySeries) -> MonthlySeries {
    let mut out = *a;
    for (slot, v) in out.iter_mut().zip(b.iter()) {
        *slot = slot.saturating_add(*v);
    }
    out
}

/// Dealer or HQ ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Dealer,
    Hq,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_series_total_saturates_instead_of_overflowing() {
        let huge = [Decimal::MAX; MONTHS];
        assert_eq!(series_total(&huge), Decimal::MAX);
        assert_eq!(checked_series_total(&huge), None);
        assert_eq!(checked_series_total(&[dec!(2); MONTHS]), Some(dec!(24)));
    }

    #[test]
    fn test_add_series_saturates_month_wise() {
        let mut a = ZERO_SERIES;
        a[0] = Decimal::MAX;
        a[1] = dec!(3);
        let out = add_series(&a, &[dec!(1); MONTHS]);
        assert_eq!(out[0], Decimal::MAX);
        assert_eq!(out[1], dec!(4));
    }
}
