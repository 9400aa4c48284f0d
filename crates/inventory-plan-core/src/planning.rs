use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assembly::{assemble_period, PeriodSources};
use crate::error::InventoryError;
use crate::model::{AccountKey, PeriodRaw, PeriodTables, RawRow, RowKey, Table};
use crate::recalc::{
    recalc_on_dealer_woi_change, recalc_on_hq_plan_change, recalc_on_hq_woi_change, PlanEdit,
};
use crate::rollforward::{
    build_table, checked_sell_through, checked_weeks_of_inventory, year_days,
};
use crate::solver::{solve_dealer_target, solve_hq_target, SolverConfig, WoiTargets};
use crate::types::{
    checked_series_total, series_total, with_metadata, ComputationOutput, Tier, Units, Weeks,
};
use crate::InventoryResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Prior-year actuals plus forecast assumptions for a planning year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    /// The forecast year being planned
    pub year: i32,
    /// Dealer actuals of the year before `year`
    pub actual_dealer: Vec<RawRow>,
    /// HQ actuals of the year before `year`
    pub actual_hq: Vec<RawRow>,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// A single user edit on a computed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edit {
    DealerWoi { key: AccountKey, woi: Weeks },
    HqWoi { key: AccountKey, woi: Weeks },
    HqPlan { key: AccountKey, plan: PlanEdit },
}

/// A previously computed period and the edit to apply to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditInput {
    pub year: i32,
    pub tables: PeriodTables,
    pub edit: Edit,
}

/// What an edit envelope records: the edit itself, not the snapshot it ran on.
#[derive(Serialize)]
struct EditAssumptions<'a> {
    year: i32,
    edit: &'a Edit,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Roll forward actual dealer and HQ rows for one calendar year.
pub fn build_period_tables(
    input: &PeriodRaw,
) -> InventoryResult<ComputationOutput<PeriodTables>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("build_period_tables", year = input.year).entered();

    let days = validate_year(input.year)?;
    validate_rows("dealer", &input.dealer)?;
    validate_rows("hq", &input.hq)?;

    for (tier, rows) in [(Tier::Dealer, &input.dealer), (Tier::Hq, &input.hq)] {
        warn_missing_accounts(tier, rows, &mut warnings);
        warn_unbalanced(tier, rows, &mut warnings);
        warn_out_of_range(tier, rows, days, &mut warnings);
    }

    let output = PeriodTables {
        dealer: build_table(&input.dealer, days),
        hq: build_table(&input.hq, days),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Inventory Roll-Forward (sell-through, leap-aware WOI)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Assemble raw rows from warehouse aggregates, then roll them forward.
pub fn assemble_and_build(
    sources: &PeriodSources,
) -> InventoryResult<ComputationOutput<PeriodTables>> {
    validate_year(sources.year)?;
    let raw = assemble_period(sources);
    build_period_tables(&raw)
}

/// Solve a forecast year: dealer sell-in for the dealer target WOI, then HQ
/// purchases for the HQ target WOI against the dealer's solved sell-in.
pub fn plan_period(input: &PlanInput) -> InventoryResult<ComputationOutput<PeriodTables>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("plan_period", year = input.year).entered();

    let days = validate_year(input.year)?;
    validate_rows("actual_dealer", &input.actual_dealer)?;
    validate_rows("actual_hq", &input.actual_hq)?;
    validate_solver(&input.solver)?;

    let cfg = &input.solver;
    let dealer_raw = solve_dealer_target(&input.actual_dealer, &cfg.dealer_target, cfg.growth_rate_pct);
    let hq_raw = solve_hq_target(&input.actual_hq, &dealer_raw, &cfg.hq_target);

    for (tier, rows) in [(Tier::Dealer, &dealer_raw), (Tier::Hq, &hq_raw)] {
        warn_missing_accounts(tier, rows, &mut warnings);
        warn_overstocked(tier, rows, &mut warnings);
        warn_out_of_range(tier, rows, days, &mut warnings);
    }

    let output = PeriodTables {
        dealer: build_table(&dealer_raw, days),
        hq: build_table(&hq_raw, days),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Target-WOI Solve (52-week demand rate, remainder to December)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Apply one edit to a computed snapshot without touching external data.
pub fn apply_edit(input: &EditInput) -> InventoryResult<ComputationOutput<PeriodTables>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("apply_edit", year = input.year).entered();

    let days = validate_year(input.year)?;

    let (output, methodology) = match input.edit {
        Edit::DealerWoi { key, woi } => {
            validate_weeks("edit.woi", woi)?;
            require_leaf(Tier::Dealer, &input.tables.dealer, key)?;
            (
                recalc_on_dealer_woi_change(&input.tables, key, woi, days),
                "Dealer WOI re-solve with HQ demand propagation",
            )
        }
        Edit::HqWoi { key, woi } => {
            validate_weeks("edit.woi", woi)?;
            require_leaf(Tier::Hq, &input.tables.hq, key)?;
            (
                recalc_on_hq_woi_change(&input.tables, key, woi, days),
                "HQ WOI re-solve",
            )
        }
        Edit::HqPlan { key, plan } => {
            let total = match plan {
                PlanEdit::SellIn(t) | PlanEdit::SellOut(t) => t,
            };
            if total < Decimal::ZERO {
                return Err(InventoryError::InvalidInput {
                    field: "edit.plan.total".into(),
                    reason: "Plan total cannot be negative".into(),
                });
            }
            require_leaf(Tier::Hq, &input.tables.hq, key)?;
            (
                recalc_on_hq_plan_change(&input.tables, key, plan, days),
                "HQ plan total redistribution",
            )
        }
    };

    let edited = match input.edit {
        Edit::DealerWoi { key, .. } | Edit::HqWoi { key, .. } | Edit::HqPlan { key, .. } => key,
    };
    warn_edit_out_of_range(&output, edited, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    let assumptions = EditAssumptions {
        year: input.year,
        edit: &input.edit,
    };

    Ok(with_metadata(
        methodology,
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Four-digit calendar years only.
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

fn validate_year(year: i32) -> InventoryResult<u32> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) || NaiveDate::from_ymd_opt(year, 1, 1).is_none() {
        return Err(InventoryError::DateError(format!(
            "Year {year} is outside the supported range {MIN_YEAR}..={MAX_YEAR}"
        )));
    }
    Ok(year_days(year))
}

fn validate_rows(field: &str, rows: &[RawRow]) -> InventoryResult<()> {
    if rows.is_empty() {
        return Err(InventoryError::InsufficientData(format!(
            "At least one {field} row is required."
        )));
    }
    Ok(())
}

fn validate_weeks(field: &str, weeks: Weeks) -> InventoryResult<()> {
    if weeks < Decimal::ZERO {
        return Err(InventoryError::InvalidInput {
            field: field.into(),
            reason: "Weeks of inventory cannot be negative".into(),
        });
    }
    Ok(())
}

fn validate_targets(field: &str, targets: &WoiTargets) -> InventoryResult<()> {
    validate_weeks(&format!("{field}.clothing"), targets.clothing)?;
    validate_weeks(&format!("{field}.accessory"), targets.accessory)
}

fn validate_solver(cfg: &SolverConfig) -> InventoryResult<()> {
    if cfg.growth_rate_pct <= -Decimal::ONE_HUNDRED {
        return Err(InventoryError::InvalidInput {
            field: "solver.growth_rate_pct".into(),
            reason: "Growth rate must be greater than -100%".into(),
        });
    }
    validate_targets("solver.dealer_target", &cfg.dealer_target)?;
    validate_targets("solver.hq_target", &cfg.hq_target)
}

fn require_leaf(tier: Tier, table: &Table, key: AccountKey) -> InventoryResult<()> {
    if table.leaf(key).is_none() {
        return Err(InventoryError::InsufficientData(format!(
            "{} table has no row for '{key}'",
            tier_name(tier)
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn tier_name(tier: Tier) -> &'static str {
    match tier {
        Tier::Dealer => "Dealer",
        Tier::Hq => "HQ",
    }
}

fn warn_missing_accounts(tier: Tier, rows: &[RawRow], warnings: &mut Vec<String>) {
    for key in AccountKey::ALL {
        if !rows.iter().any(|r| r.key == key) {
            warnings.push(format!(
                "{} input has no row for '{key}'; it is omitted from the table.",
                tier_name(tier)
            ));
        }
    }
}

fn warn_unbalanced(tier: Tier, rows: &[RawRow], warnings: &mut Vec<String>) {
    for r in rows {
        let rolled = r
            .opening
            .saturating_add(series_total(&r.sell_in))
            .saturating_sub(series_total(&r.sell_out));
        let gap = r.closing.saturating_sub(rolled);
        if !gap.is_zero() {
            warnings.push(format!(
                "{} '{}': closing differs from opening + sell-in - sell-out by {}.",
                tier_name(tier),
                r.key,
                gap.normalize()
            ));
        }
    }
}

fn warn_overstocked(tier: Tier, rows: &[RawRow], warnings: &mut Vec<String>) {
    for r in rows {
        let required = r
            .closing
            .saturating_add(series_total(&r.sell_out))
            .saturating_sub(r.opening);
        if required < Decimal::ZERO {
            warnings.push(format!(
                "{} '{}': opening stock exceeds target closing plus demand by {}; sell-in floored at zero.",
                tier_name(tier),
                r.key,
                (-required).normalize()
            ));
        }
    }
}

fn out_of_range_message(tier: Tier, key: impl std::fmt::Display) -> String {
    format!(
        "{} '{key}': figures exceed the decimal range; totals saturated and ratios set to zero.",
        tier_name(tier)
    )
}

/// `None` when any figure a row derives from these inputs leaves the `Decimal` range.
fn checked_row(
    key: RowKey,
    opening: Units,
    sell_in_total: Units,
    sell_out_total: Units,
    closing: Units,
    demand_total: Units,
    days: u32,
) -> Option<()> {
    opening.checked_add(sell_in_total)?.checked_sub(sell_out_total)?;
    closing.checked_sub(opening)?;
    closing.checked_add(sell_out_total)?;
    checked_sell_through(key.sell_through_basis(), opening, sell_in_total, sell_out_total)?;
    checked_weeks_of_inventory(closing, demand_total, days)?;
    Some(())
}

fn warn_out_of_range(tier: Tier, rows: &[RawRow], days: u32, warnings: &mut Vec<String>) {
    let mut tier_totals = Some([Decimal::ZERO; 4]);
    for r in rows {
        let in_range = (|| {
            let sell_in = checked_series_total(&r.sell_in)?;
            let sell_out = checked_series_total(&r.sell_out)?;
            let demand = checked_series_total(&r.woi_basis())?;
            tier_totals = tier_totals.and_then(|[o, i, s, c]| {
                Some([
                    o.checked_add(r.opening)?,
                    i.checked_add(sell_in)?,
                    s.checked_add(sell_out)?,
                    c.checked_add(r.closing)?,
                ])
            });
            checked_row(RowKey::Leaf(r.key), r.opening, sell_in, sell_out, r.closing, demand, days)
        })();
        if in_range.is_none() {
            tier_totals = None;
            warnings.push(out_of_range_message(tier, r.key));
        }
    }
    if tier_totals.is_none() {
        warnings.push(out_of_range_message(tier, RowKey::Total));
    }
}

fn warn_edit_out_of_range(tables: &PeriodTables, key: AccountKey, warnings: &mut Vec<String>) {
    for (tier, table) in [(Tier::Dealer, &tables.dealer), (Tier::Hq, &tables.hq)] {
        let Some(row) = table.leaf(key) else { continue };
        let in_range = (|| {
            let sell_in = checked_series_total(&row.sell_in)?;
            let sell_out = checked_series_total(&row.sell_out)?;
            row.opening.checked_add(sell_in)?.checked_sub(sell_out)?;
            Some(())
        })();
        if in_range.is_none() {
            warnings.push(out_of_range_message(tier, key));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
