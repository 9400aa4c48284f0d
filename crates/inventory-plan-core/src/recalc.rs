use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{AccountKey, ComputedRow, PeriodTables, Table};
use crate::rollforward::{assemble_table, sell_through};
use crate::solver::{distribute_over_months, solve_leaf, LeafSolution, SOLVE_WEEKS_PER_YEAR};
use crate::types::{series_total, MonthlySeries, Units, Weeks};

/// An edit to one of an HQ leaf's annual plan totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "total", rename_all = "snake_case")]
pub enum PlanEdit {
    /// New annual purchase total
    SellIn(Units),
    /// New annual shipment-to-dealer total
    SellOut(Units),
}

// ---------------------------------------------------------------------------
// Leaf re-solve
// ---------------------------------------------------------------------------

fn apply_solution(row: &ComputedRow, sell_out: MonthlySeries, solution: LeafSolution) -> ComputedRow {
    let sell_in_total = series_total(&solution.sell_in);
    let closing = solution.target_closing;
    ComputedRow {
        sell_in: solution.sell_in,
        sell_in_total,
        sell_out,
        sell_out_total: solution.sell_out_total,
        closing,
        delta: closing.saturating_sub(row.opening),
        sell_through: sell_through(
            row.key.sell_through_basis(),
            row.opening,
            sell_in_total,
            solution.sell_out_total,
        ),
        ..row.clone()
    }
}

/// Re-solve a leaf for a new target WOI, keeping its sell-out and opening.
///
/// The new sell-in follows the leaf's current monthly shape. Non-leaf rows
/// are returned unchanged.
pub fn recalc_leaf_from_woi(row: &ComputedRow, new_woi: Weeks) -> ComputedRow {
    if !row.is_leaf() {
        return row.clone();
    }
    let solution = solve_leaf(row.opening, row.sell_out_total, &row.sell_in, new_woi);
    ComputedRow {
        woi: new_woi,
        ..apply_solution(row, row.sell_out, solution)
    }
}

/// Replace an HQ leaf's demand and re-solve it at its current WOI.
///
/// `woi_sell_out` is carried over unchanged, so ancestor WOI keeps measuring
/// against the retail demand the snapshot was built with.
fn resolve_hq_with_demand(hq_row: &ComputedRow, sell_out: MonthlySeries) -> ComputedRow {
    let solution = solve_leaf(hq_row.opening, series_total(&sell_out), &hq_row.sell_in, hq_row.woi);
    apply_solution(hq_row, sell_out, solution)
}

/// Rebuild a table's ancestors after one leaf has been replaced.
///
/// Every other leaf is carried over as-is.
fn rebuild_with_leaf(table: &Table, updated: ComputedRow, year_days: u32) -> Table {
    let leaves: Vec<ComputedRow> = table
        .leaves()
        .map(|r| {
            if r.key == updated.key {
                updated.clone()
            } else {
                r.clone()
            }
        })
        .collect();
    assemble_table(leaves, year_days)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A dealer leaf's target WOI was edited.
///
/// The dealer leaf is re-solved and its ancestors rebuilt; the HQ leaf of the
/// same account then takes the dealer's new sell-in as its sell-out and is
/// re-solved at its existing WOI. No other leaf changes.
pub fn recalc_on_dealer_woi_change(
    tables: &PeriodTables,
    key: AccountKey,
    new_woi: Weeks,
    year_days: u32,
) -> PeriodTables {
    let Some(dealer_row) = tables.dealer.leaf(key) else {
        return tables.clone();
    };

    let dealer_leaf = recalc_leaf_from_woi(dealer_row, new_woi);
    let shipped = dealer_leaf.sell_in;
    let dealer = rebuild_with_leaf(&tables.dealer, dealer_leaf, year_days);

    #[cfg(feature = "tracing")]
    tracing::debug!(%key, %new_woi, "dealer WOI edit propagated to HQ demand");

    let hq = match tables.hq.leaf(key) {
        Some(hq_row) => {
            let hq_leaf = resolve_hq_with_demand(hq_row, shipped);
            rebuild_with_leaf(&tables.hq, hq_leaf, year_days)
        }
        None => tables.hq.clone(),
    };

    PeriodTables { dealer, hq }
}

/// An HQ leaf's target WOI was edited. The dealer tier is not affected.
pub fn recalc_on_hq_woi_change(
    tables: &PeriodTables,
    key: AccountKey,
    new_woi: Weeks,
    year_days: u32,
) -> PeriodTables {
    let Some(hq_row) = tables.hq.leaf(key) else {
        return tables.clone();
    };

    let hq_leaf = recalc_leaf_from_woi(hq_row, new_woi);
    PeriodTables {
        dealer: tables.dealer.clone(),
        hq: rebuild_with_leaf(&tables.hq, hq_leaf, year_days),
    }
}

/// An HQ leaf's annual sell-in or sell-out plan total was edited.
///
/// The new total is spread over the leaf's existing monthly shape. A
/// sell-out edit re-solves purchases at the leaf's current WOI; a sell-in
/// edit rolls the stock forward and re-derives WOI on the 52-week solve basis.
/// The dealer tier is not affected.
pub fn recalc_on_hq_plan_change(
    tables: &PeriodTables,
    key: AccountKey,
    edit: PlanEdit,
    year_days: u32,
) -> PeriodTables {
    let Some(hq_row) = tables.hq.leaf(key) else {
        return tables.clone();
    };

    let hq_leaf = match edit {
        PlanEdit::SellOut(total) => {
            let sell_out = distribute_over_months(total, &hq_row.sell_out);
            resolve_hq_with_demand(hq_row, sell_out)
        }
        PlanEdit::SellIn(total) => {
            let sell_in = distribute_over_months(total, &hq_row.sell_in);
            let sell_in_total = series_total(&sell_in);
            let closing = hq_row
                .opening
                .saturating_add(sell_in_total)
                .saturating_sub(hq_row.sell_out_total);
            // Measured against shipments on the solve basis, not `woi_sell_out`.
            let weekly_rate = hq_row.sell_out_total / SOLVE_WEEKS_PER_YEAR;
            let woi = if weekly_rate > Decimal::ZERO {
                closing.checked_div(weekly_rate).unwrap_or(Decimal::ZERO)
            } else {
                Decimal::ZERO
            };
            ComputedRow {
                sell_in,
                sell_in_total,
                closing,
                delta: closing.saturating_sub(hq_row.opening),
                sell_through: sell_through(
                    hq_row.key.sell_through_basis(),
                    hq_row.opening,
                    sell_in_total,
                    hq_row.sell_out_total,
                ),
                woi,
                ..hq_row.clone()
            }
        }
    };

    PeriodTables {
        dealer: tables.dealer.clone(),
        hq: rebuild_with_leaf(&tables.hq, hq_leaf, year_days),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
