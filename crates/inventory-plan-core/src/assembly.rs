use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{AccountKey, PeriodRaw, RawRow};
use crate::types::{add_series, MonthlySeries, Units, MONTHS, ZERO_SERIES};

/// Warehouse aggregates are reported in base currency units; tables are kept in thousands.
const UNITS_PER_THOUSAND: Decimal = dec!(1000);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Month-end stock balances for one account. `None` marks a month not yet closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSeries {
    pub key: AccountKey,
    /// Prior-year December balance
    pub opening: Option<Units>,
    pub monthly: Vec<Option<Units>>,
}

/// A monthly flow (retail sales, shipments, purchases) for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSeries {
    pub key: AccountKey,
    pub monthly: Vec<Option<Units>>,
}

/// The same measure reported separately for each tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSeries<T> {
    pub dealer: Vec<T>,
    pub hq: Vec<T>,
}

/// Per-account monthly aggregates for one year, as returned by the query layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSources {
    pub year: i32,
    pub stock: TierSeries<StockSeries>,
    /// Consumer sales at dealer stores and HQ-operated stores
    pub retail: TierSeries<FlowSeries>,
    /// HQ to dealer shipments
    pub shipment: Vec<FlowSeries>,
    /// HQ purchases; when absent HQ sell-in is zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase: Option<Vec<FlowSeries>>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_thousands(v: Option<Units>) -> Units {
    v.unwrap_or(Decimal::ZERO) / UNITS_PER_THOUSAND
}

/// Pad or truncate to twelve months, unclosed months counting as zero.
fn to_monthly_thousands(values: &[Option<Units>]) -> MonthlySeries {
    let mut out = ZERO_SERIES;
    for (slot, v) in out.iter_mut().zip(values.iter()) {
        *slot = to_thousands(*v);
    }
    out
}

// A key reported twice keeps its last series.
fn flow_for(rows: &[FlowSeries], key: AccountKey) -> MonthlySeries {
    rows.iter()
        .rev()
        .find(|r| r.key == key)
        .map(|r| to_monthly_thousands(&r.monthly))
        .unwrap_or(ZERO_SERIES)
}

fn stock_for(rows: &[StockSeries], key: AccountKey) -> (Units, Units) {
    match rows.iter().rev().find(|r| r.key == key) {
        Some(s) => (
            to_thousands(s.opening),
            to_thousands(s.monthly.get(MONTHS - 1).copied().flatten()),
        ),
        None => (Decimal::ZERO, Decimal::ZERO),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build dealer and HQ raw rows for every account from warehouse aggregates.
///
/// Dealer: sell-in = shipments received, sell-out = dealer retail.
/// HQ: sell-in = purchases, sell-out = shipments, with WOI measured against
/// combined dealer and HQ retail demand.
pub fn assemble_period(sources: &PeriodSources) -> PeriodRaw {
    let mut dealer = Vec::with_capacity(AccountKey::ALL.len());
    let mut hq = Vec::with_capacity(AccountKey::ALL.len());

    for key in AccountKey::ALL {
        let shipment = flow_for(&sources.shipment, key);
        let dealer_retail = flow_for(&sources.retail.dealer, key);
        let hq_retail = flow_for(&sources.retail.hq, key);

        let (opening, closing) = stock_for(&sources.stock.dealer, key);
        dealer.push(RawRow {
            key,
            opening,
            sell_in: shipment,
            sell_out: dealer_retail,
            closing,
            woi_sell_out: None,
        });

        let (opening, closing) = stock_for(&sources.stock.hq, key);
        let purchase = sources
            .purchase
            .as_deref()
            .map(|rows| flow_for(rows, key))
            .unwrap_or(ZERO_SERIES);
        hq.push(RawRow {
            key,
            opening,
            sell_in: purchase,
            sell_out: shipment,
            closing,
            woi_sell_out: Some(add_series(&dealer_retail, &hq_retail)),
        });
    }

    PeriodRaw {
        year: sources.year,
        dealer,
        hq,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flow(key: AccountKey, v: Decimal) -> FlowSeries {
        FlowSeries {
            key,
            monthly: vec![Some(v); 12],
        }
    }

    fn month_end_stock(december: Decimal) -> Vec<Option<Decimal>> {
        let mut monthly = vec![Some(dec!(1)); 12];
        monthly[11] = Some(december);
        monthly
    }

    fn sources() -> PeriodSources {
        PeriodSources {
            year: 2025,
            stock: TierSeries {
                dealer: vec![StockSeries {
                    key: AccountKey::Shoes,
                    opening: Some(dec!(240_000)),
                    monthly: month_end_stock(dec!(230_000)),
                }],
                hq: vec![StockSeries {
                    key: AccountKey::Shoes,
                    opening: Some(dec!(400_000)),
                    monthly: vec![None; 12],
                }],
            },
            retail: TierSeries {
                dealer: vec![flow(AccountKey::Shoes, dec!(3_000))],
                hq: vec![flow(AccountKey::Shoes, dec!(1_000))],
            },
            shipment: vec![flow(AccountKey::Shoes, dec!(2_000))],
            purchase: None,
        }
    }

    #[test]
    fn test_dealer_row_mapping_in_thousands() {
        let period = assemble_period(&sources());
        let shoes = period.dealer.iter().find(|r| r.key == AccountKey::Shoes).unwrap();
        assert_eq!(shoes.opening, dec!(240));
        assert_eq!(shoes.closing, dec!(230));
        assert_eq!(shoes.sell_in, [dec!(2); 12]);
        assert_eq!(shoes.sell_out, [dec!(3); 12]);
        assert_eq!(shoes.woi_sell_out, None);
    }

    #[test]
    fn test_hq_row_uses_combined_retail_for_woi() {
        let period = assemble_period(&sources());
        let shoes = period.hq.iter().find(|r| r.key == AccountKey::Shoes).unwrap();
        assert_eq!(shoes.sell_out, [dec!(2); 12]);
        assert_eq!(shoes.sell_in, ZERO_SERIES);
        assert_eq!(shoes.woi_sell_out, Some([dec!(4); 12]));
        // December not closed yet
        assert_eq!(shoes.closing, Decimal::ZERO);
    }

    #[test]
    fn test_every_account_present_even_without_data() {
        let period = assemble_period(&sources());
        assert_eq!(period.dealer.len(), AccountKey::ALL.len());
        assert_eq!(period.hq.len(), AccountKey::ALL.len());
        let hats = period.dealer.iter().find(|r| r.key == AccountKey::Hats).unwrap();
        assert_eq!(hats.sell_in, ZERO_SERIES);
        assert_eq!(hats.opening, Decimal::ZERO);
    }

    #[test]
    fn test_duplicate_series_last_wins() {
        let mut src = sources();
        src.shipment.push(flow(AccountKey::Shoes, dec!(7_000)));
        src.stock.dealer.push(StockSeries {
            key: AccountKey::Shoes,
            opening: Some(dec!(1_000)),
            monthly: month_end_stock(dec!(9_000)),
        });
        let period = assemble_period(&src);
        let shoes = period.dealer.iter().find(|r| r.key == AccountKey::Shoes).unwrap();
        assert_eq!(shoes.sell_in, [dec!(7); 12]);
        assert_eq!(shoes.opening, dec!(1));
        assert_eq!(shoes.closing, dec!(9));
    }

    #[test]
    fn test_short_series_are_padded() {
        let mut src = sources();
        src.purchase = Some(vec![FlowSeries {
            key: AccountKey::Shoes,
            monthly: vec![Some(dec!(5_000)), None],
        }]);
        let period = assemble_period(&src);
        let shoes = period.hq.iter().find(|r| r.key == AccountKey::Shoes).unwrap();
        assert_eq!(shoes.sell_in[0], dec!(5));
        assert_eq!(shoes.sell_in[1], Decimal::ZERO);
        assert_eq!(shoes.sell_in[11], Decimal::ZERO);
    }
}
