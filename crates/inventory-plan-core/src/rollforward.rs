use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{AccountKey, Category, ComputedRow, RawRow, RowKey, SellThroughBasis, Table};
use crate::types::{add_series, series_total, MonthlySeries, Percent, Units, Weeks, ZERO_SERIES};

const DAYS_PER_WEEK: Decimal = dec!(7);

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Number of days in a calendar year: 366 for Gregorian leap years, else 365.
pub fn year_days(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

// ---------------------------------------------------------------------------
// Row formulas
// ---------------------------------------------------------------------------

/// `sell_out_total / denominator × 100`, zero when the denominator is not positive.
///
/// `None` when the ratio does not fit in a `Decimal`.
pub fn checked_sell_through(
    basis: SellThroughBasis,
    opening: Units,
    sell_in_total: Units,
    sell_out_total: Units,
) -> Option<Percent> {
    let denom = basis.denominator(opening, sell_in_total);
    if denom > Decimal::ZERO {
        sell_out_total
            .checked_div(denom)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    } else {
        Some(Decimal::ZERO)
    }
}

/// Like [`checked_sell_through`], an out-of-range ratio reading as zero.
pub fn sell_through(
    basis: SellThroughBasis,
    opening: Units,
    sell_in_total: Units,
    sell_out_total: Units,
) -> Percent {
    checked_sell_through(basis, opening, sell_in_total, sell_out_total).unwrap_or(Decimal::ZERO)
}

/// Closing stock over the weekly demand rate `demand_total / (year_days / 7)`.
///
/// `None` when the quotient does not fit in a `Decimal`.
pub fn checked_weeks_of_inventory(
    closing: Units,
    demand_total: Units,
    year_days: u32,
) -> Option<Weeks> {
    let weeks_in_year = Decimal::from(year_days) / DAYS_PER_WEEK;
    let weekly_rate = demand_total.checked_div(weeks_in_year)?;
    if weekly_rate > Decimal::ZERO {
        closing.checked_div(weekly_rate)
    } else {
        Some(Decimal::ZERO)
    }
}

/// Like [`checked_weeks_of_inventory`], an out-of-range quotient reading as zero.
pub fn weeks_of_inventory(closing: Units, demand_total: Units, year_days: u32) -> Weeks {
    checked_weeks_of_inventory(closing, demand_total, year_days).unwrap_or(Decimal::ZERO)
}

fn derive_row(
    key: RowKey,
    opening: Units,
    sell_in: MonthlySeries,
    sell_out: MonthlySeries,
    closing: Units,
    woi_sell_out: MonthlySeries,
    year_days: u32,
) -> ComputedRow {
    let sell_in_total = series_total(&sell_in);
    let sell_out_total = series_total(&sell_out);
    ComputedRow {
        key,
        opening,
        sell_in,
        sell_in_total,
        sell_out,
        sell_out_total,
        closing,
        delta: closing.saturating_sub(opening),
        sell_through: sell_through(
            key.sell_through_basis(),
            opening,
            sell_in_total,
            sell_out_total,
        ),
        woi: weeks_of_inventory(closing, series_total(&woi_sell_out), year_days),
        woi_sell_out,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive totals, delta, sell-through and WOI for one leaf account.
pub fn compute_leaf(raw: &RawRow, year_days: u32) -> ComputedRow {
    derive_row(
        RowKey::Leaf(raw.key),
        raw.opening,
        raw.sell_in,
        raw.sell_out,
        raw.closing,
        raw.woi_basis(),
        year_days,
    )
}

/// Aggregate child rows into a subtotal (or, one level up, the grand total).
///
/// Stocks are summed, monthly series are summed month-wise, and the ratios
/// are re-derived from the aggregated figures rather than averaged.
pub fn compute_subtotal(key: RowKey, children: &[ComputedRow], year_days: u32) -> ComputedRow {
    let mut opening = Decimal::ZERO;
    let mut closing = Decimal::ZERO;
    let mut sell_in = ZERO_SERIES;
    let mut sell_out = ZERO_SERIES;
    let mut woi_sell_out = ZERO_SERIES;

    for child in children {
        opening = opening.saturating_add(child.opening);
        closing = closing.saturating_add(child.closing);
        sell_in = add_series(&sell_in, &child.sell_in);
        sell_out = add_series(&sell_out, &child.sell_out);
        woi_sell_out = add_series(&woi_sell_out, &child.woi_sell_out);
    }

    derive_row(
        key,
        opening,
        sell_in,
        sell_out,
        closing,
        woi_sell_out,
        year_days,
    )
}

/// Assemble the ordered table from already-computed leaves.
///
/// Leaves are placed in canonical account order; accounts without a leaf
/// are omitted, their category subtotal still being emitted.
pub fn assemble_table(leaves: Vec<ComputedRow>, year_days: u32) -> Table {
    let mut clothing: Vec<ComputedRow> = Vec::with_capacity(AccountKey::CLOTHING.len());
    let mut accessory: Vec<ComputedRow> = Vec::with_capacity(AccountKey::ACCESSORY.len());

    for category in Category::ALL {
        for key in category.accounts() {
            // Last occurrence wins when a key is supplied twice.
            let Some(leaf) = leaves.iter().rev().find(|r| r.key == RowKey::Leaf(*key)) else {
                continue;
            };
            match category {
                Category::Clothing => clothing.push(leaf.clone()),
                Category::Accessory => accessory.push(leaf.clone()),
            }
        }
    }

    let clothing_subtotal =
        compute_subtotal(RowKey::Subtotal(Category::Clothing), &clothing, year_days);
    let accessory_subtotal =
        compute_subtotal(RowKey::Subtotal(Category::Accessory), &accessory, year_days);
    let grand_total = compute_subtotal(
        RowKey::Total,
        &[clothing_subtotal.clone(), accessory_subtotal.clone()],
        year_days,
    );

    let mut rows = Vec::with_capacity(3 + clothing.len() + accessory.len());
    rows.push(grand_total);
    rows.push(clothing_subtotal);
    rows.extend(clothing);
    rows.push(accessory_subtotal);
    rows.extend(accessory);

    Table { rows }
}

/// Roll forward every raw row and build the full table
/// `[total, clothing subtotal, clothing leaves, accessory subtotal, accessory leaves]`.
pub fn build_table(raw_rows: &[RawRow], year_days: u32) -> Table {
    let leaves = raw_rows.iter().map(|r| compute_leaf(r, year_days)).collect();
    assemble_table(leaves, year_days)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat(v: Decimal) -> MonthlySeries {
        [v; 12]
    }

    fn raw(key: AccountKey, opening: Decimal, sell_in: Decimal, sell_out: Decimal, closing: Decimal) -> RawRow {
        RawRow {
            key,
            opening,
            sell_in: flat(sell_in),
            sell_out: flat(sell_out),
            closing,
            woi_sell_out: None,
        }
    }

    #[test]
    fn test_year_days_leap_aware() {
        assert_eq!(year_days(2024), 366);
        assert_eq!(year_days(2025), 365);
        assert_eq!(year_days(1900), 365);
        assert_eq!(year_days(2000), 366);
    }

    #[test]
    fn test_leaf_totals_and_delta() {
        let row = compute_leaf(
            &raw(AccountKey::Shoes, dec!(240), dec!(10), dec!(8), dec!(264)),
            365,
        );
        assert_eq!(row.sell_in_total, dec!(120));
        assert_eq!(row.sell_out_total, dec!(96));
        assert_eq!(row.delta, dec!(24));
        assert!(row.is_leaf());
    }

    #[test]
    fn test_accessory_sell_through_uses_sell_in_only() {
        let row = compute_leaf(
            &raw(AccountKey::Hats, dec!(100), dec!(10), dec!(5), dec!(160)),
            365,
        );
        // 60 / 120 × 100
        assert_eq!(row.sell_through, dec!(50));
    }

    #[test]
    fn test_clothing_sell_through_includes_opening() {
        let row = compute_leaf(
            &raw(AccountKey::CurrentSpring, dec!(80), dec!(10), dec!(5), dec!(140)),
            365,
        );
        // 60 / (80 + 120) × 100
        assert_eq!(row.sell_through, dec!(30));
    }

    #[test]
    fn test_zero_denominator_gives_zero_sell_through() {
        let row = compute_leaf(
            &raw(AccountKey::Bags, dec!(50), Decimal::ZERO, dec!(2), dec!(26)),
            365,
        );
        assert_eq!(row.sell_through, Decimal::ZERO);
    }

    #[test]
    fn test_woi_uses_year_days() {
        let r = raw(AccountKey::Other, dec!(0), dec!(0), dec!(7), dec!(84));
        let common = compute_leaf(&r, 365);
        let leap = compute_leaf(&r, 366);
        // 84 / (84 / (365 / 7)) = 365 / 7
        assert_eq!(common.woi.round_dp(6), (dec!(365) / dec!(7)).round_dp(6));
        assert_eq!(leap.woi.round_dp(6), (dec!(366) / dec!(7)).round_dp(6));
        assert!(leap.woi > common.woi);
    }

    #[test]
    fn test_woi_zero_without_demand() {
        let row = compute_leaf(
            &raw(AccountKey::OffSeason, dec!(10), dec!(0), dec!(0), dec!(10)),
            365,
        );
        assert_eq!(row.woi, Decimal::ZERO);
    }

    #[test]
    fn test_woi_prefers_dedicated_demand_series() {
        let mut r = raw(AccountKey::Shoes, dec!(0), dec!(0), dec!(1), dec!(52));
        r.woi_sell_out = Some(flat(dec!(2)));
        let row = compute_leaf(&r, 364);
        // weekly rate = 24 / 52
        assert_eq!(row.woi, dec!(52) / (dec!(24) / dec!(52)));
        assert_eq!(row.sell_out_total, dec!(12));
    }

    #[test]
    fn test_negative_values_propagate() {
        let row = compute_leaf(
            &raw(AccountKey::Hats, dec!(-5), dec!(-1), dec!(0), dec!(-17)),
            365,
        );
        assert_eq!(row.sell_in_total, dec!(-12));
        assert_eq!(row.delta, dec!(-12));
        assert_eq!(row.sell_through, Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_sums_saturate() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        let row = compute_leaf(&raw(AccountKey::Shoes, dec!(0), huge, dec!(1), dec!(0)), 365);
        assert_eq!(row.sell_in_total, Decimal::MAX);
        assert_eq!(row.sell_through, dec!(12) / Decimal::MAX * dec!(100));

        let table = build_table(
            &[
                raw(AccountKey::Shoes, Decimal::MAX, dec!(0), dec!(0), Decimal::MAX),
                raw(AccountKey::Hats, Decimal::MAX, dec!(0), dec!(0), Decimal::MAX),
            ],
            365,
        );
        assert_eq!(table.total().unwrap().opening, Decimal::MAX);
    }

    #[test]
    fn test_overflowing_ratio_reads_as_zero() {
        // 1.2e10 / 1e-22 does not fit in a Decimal
        let mut r = raw(AccountKey::Shoes, dec!(0), dec!(0), dec!(1_000_000_000), dec!(5));
        r.sell_in[0] = Decimal::new(1, 22);
        let row = compute_leaf(&r, 365);
        assert_eq!(row.sell_through, Decimal::ZERO);
        assert_eq!(
            checked_sell_through(SellThroughBasis::SellIn, dec!(0), r.sell_in[0], row.sell_out_total),
            None
        );
        assert!(row.woi > Decimal::ZERO);

        assert_eq!(checked_weeks_of_inventory(Decimal::MAX, Decimal::new(1, 20), 365), None);
        assert_eq!(weeks_of_inventory(Decimal::MAX, Decimal::new(1, 20), 365), Decimal::ZERO);
    }

    #[test]
    fn test_table_order_and_shape() {
        let rows: Vec<RawRow> = AccountKey::ALL
            .iter()
            .rev()
            .map(|k| raw(*k, dec!(1), dec!(1), dec!(1), dec!(1)))
            .collect();
        let table = build_table(&rows, 365);
        let keys: Vec<RowKey> = table.rows.iter().map(|r| r.key).collect();
        let mut expected = vec![RowKey::Total, RowKey::Subtotal(Category::Clothing)];
        expected.extend(AccountKey::CLOTHING.iter().map(|k| RowKey::Leaf(*k)));
        expected.push(RowKey::Subtotal(Category::Accessory));
        expected.extend(AccountKey::ACCESSORY.iter().map(|k| RowKey::Leaf(*k)));
        assert_eq!(keys, expected);
        assert_eq!(table.rows.iter().filter(|r| r.is_total()).count(), 1);
        assert_eq!(table.rows.iter().filter(|r| r.is_subtotal()).count(), 2);
    }

    #[test]
    fn test_missing_keys_are_omitted() {
        let rows = vec![raw(AccountKey::Shoes, dec!(10), dec!(1), dec!(1), dec!(10))];
        let table = build_table(&rows, 365);
        assert_eq!(table.rows.len(), 4);
        let clothing = table.subtotal(Category::Clothing).unwrap();
        assert_eq!(clothing.opening, Decimal::ZERO);
        assert_eq!(table.total().unwrap().opening, dec!(10));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let rows = vec![
            raw(AccountKey::Bags, dec!(1), dec!(0), dec!(0), dec!(1)),
            raw(AccountKey::Bags, dec!(2), dec!(0), dec!(0), dec!(2)),
        ];
        let table = build_table(&rows, 365);
        assert_eq!(table.leaf(AccountKey::Bags).unwrap().opening, dec!(2));
        assert_eq!(table.leaves().count(), 1);
    }
}
