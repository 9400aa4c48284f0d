use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{AccountKey, Category, RawRow};
use crate::types::{series_total, MonthlySeries, Percent, Units, Weeks, MONTHS, ZERO_SERIES};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The solver normalises demand over a fixed 52-week year, independently of
/// the leap-aware `year_days` used when the table is rolled forward.
pub const SOLVE_WEEKS_PER_YEAR: Decimal = dec!(52);

const DECEMBER: usize = MONTHS - 1;

pub const DEFAULT_DEALER_WOI: Weeks = dec!(30);
pub const DEFAULT_HQ_WOI: Weeks = dec!(10);
pub const DEFAULT_GROWTH_RATE_PCT: Percent = dec!(5);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Target ending weeks of inventory per category group.
///
/// Deserializes from a bare number (same target for every account) or from
/// `{ "clothing": .., "accessory": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WoiTargetsRepr")]
pub struct WoiTargets {
    pub clothing: Weeks,
    pub accessory: Weeks,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WoiTargetsRepr {
    Uniform(Weeks),
    ByCategory { clothing: Weeks, accessory: Weeks },
}

impl From<WoiTargetsRepr> for WoiTargets {
    fn from(repr: WoiTargetsRepr) -> Self {
        match repr {
            WoiTargetsRepr::Uniform(weeks) => WoiTargets::uniform(weeks),
            WoiTargetsRepr::ByCategory {
                clothing,
                accessory,
            } => WoiTargets {
                clothing,
                accessory,
            },
        }
    }
}

impl WoiTargets {
    pub fn uniform(weeks: Weeks) -> Self {
        WoiTargets {
            clothing: weeks,
            accessory: weeks,
        }
    }

    pub fn for_key(&self, key: AccountKey) -> Weeks {
        match key.category() {
            Category::Clothing => self.clothing,
            Category::Accessory => self.accessory,
        }
    }
}

/// Forecast-year assumptions for both tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub dealer_target: WoiTargets,
    pub hq_target: WoiTargets,
    /// Uniform growth applied to prior-year sell-out, in percent
    pub growth_rate_pct: Percent,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            dealer_target: WoiTargets::uniform(DEFAULT_DEALER_WOI),
            hq_target: WoiTargets::uniform(DEFAULT_HQ_WOI),
            growth_rate_pct: DEFAULT_GROWTH_RATE_PCT,
        }
    }
}

// ---------------------------------------------------------------------------
// Solve primitives
// ---------------------------------------------------------------------------

/// Half-up rounding to whole units (`floor(x + 0.5)`), so -2.5 rounds to -2.
pub fn round_half_up(x: Decimal) -> Decimal {
    x.saturating_add(dec!(0.5)).floor()
}

/// `round(sell_out_total / 52 × weeks)`, zero when there is no demand.
pub fn target_closing(sell_out_total: Units, target_weeks: Weeks) -> Units {
    let weekly_rate = sell_out_total / SOLVE_WEEKS_PER_YEAR;
    if weekly_rate > Decimal::ZERO {
        round_half_up(weekly_rate.saturating_mul(target_weeks))
    } else {
        Decimal::ZERO
    }
}

/// Solve `closing = opening + sell_in - sell_out` for sell-in.
pub fn required_sell_in(target_closing: Units, sell_out_total: Units, opening: Units) -> Units {
    target_closing
        .saturating_add(sell_out_total)
        .saturating_sub(opening)
}

/// Spread `total` across the year.
///
/// Non-positive totals yield all zeros. Otherwise the `shape` series is
/// scaled proportionally when it has a positive total, or the total is split
/// evenly; either way December absorbs the rounding remainder so the months
/// sum to `total` exactly. A scale that leaves the decimal range falls back
/// to the even split.
pub fn distribute_over_months(total: Units, shape: &MonthlySeries) -> MonthlySeries {
    if total <= Decimal::ZERO {
        return ZERO_SERIES;
    }

    let shape_total = series_total(shape);
    let proportional = if shape_total > Decimal::ZERO {
        scale_shape(total, shape_total, shape)
    } else {
        None
    };
    let mut months = proportional.unwrap_or_else(|| {
        let per_month = (total / Decimal::from(MONTHS as u32)).floor();
        [per_month; MONTHS]
    });

    let drift = total.saturating_sub(series_total(&months));
    months[DECEMBER] = months[DECEMBER].saturating_add(drift);
    months
}

fn scale_shape(total: Units, shape_total: Units, shape: &MonthlySeries) -> Option<MonthlySeries> {
    let scale = total.checked_div(shape_total)?;
    let mut months = ZERO_SERIES;
    for (slot, v) in months.iter_mut().zip(shape.iter()) {
        *slot = round_half_up(v.checked_mul(scale)?);
    }
    Some(months)
}

/// Outcome of solving one leaf for a target WOI.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSolution {
    pub sell_out_total: Units,
    pub target_closing: Units,
    /// May be negative when opening stock already covers the target
    pub required_sell_in: Units,
    pub sell_in: MonthlySeries,
}

impl LeafSolution {
    /// Opening stock exceeded demand plus target stock; sell-in was floored at zero.
    pub fn is_overstocked(&self) -> bool {
        self.required_sell_in < Decimal::ZERO
    }
}

/// Solve a single leaf: target closing from demand, required sell-in from the
/// balance equation, and its monthly distribution over `prior_sell_in`.
pub fn solve_leaf(
    opening: Units,
    sell_out_total: Units,
    prior_sell_in: &MonthlySeries,
    target_weeks: Weeks,
) -> LeafSolution {
    let target_closing = target_closing(sell_out_total, target_weeks);
    let required = required_sell_in(target_closing, sell_out_total, opening);
    let sell_in = distribute_over_months(required, prior_sell_in);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        %opening,
        %sell_out_total,
        %target_weeks,
        %target_closing,
        %required,
        "solved leaf for target WOI"
    );

    LeafSolution {
        sell_out_total,
        target_closing,
        required_sell_in: required,
        sell_in,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn solved_row(key: AccountKey, opening: Units, sell_out: MonthlySeries, solution: LeafSolution) -> RawRow {
    RawRow {
        key,
        opening,
        sell_in: solution.sell_in,
        sell_out,
        closing: solution.target_closing,
        woi_sell_out: None,
    }
}

/// Project the dealer tier into the forecast year.
///
/// Each leaf opens at last year's close, sells last year's sell-out grown by
/// `growth_rate_pct`, and receives whatever sell-in lands it on its target WOI.
pub fn solve_dealer_target(
    actual: &[RawRow],
    targets: &WoiTargets,
    growth_rate_pct: Percent,
) -> Vec<RawRow> {
    let factor = Decimal::ONE.saturating_add(growth_rate_pct / Decimal::ONE_HUNDRED);

    actual
        .iter()
        .map(|r| {
            let opening = r.closing;
            let sell_out = r.sell_out.map(|v| round_half_up(v.saturating_mul(factor)));
            let solution = solve_leaf(
                opening,
                series_total(&sell_out),
                &r.sell_in,
                targets.for_key(r.key),
            );
            solved_row(r.key, opening, sell_out, solution)
        })
        .collect()
}

/// Project the HQ tier into the forecast year.
///
/// HQ demand is the dealer's solved sell-in for the same account, so this
/// must run after [`solve_dealer_target`]. Accounts the dealer lacks see no demand.
pub fn solve_hq_target(
    actual_hq: &[RawRow],
    dealer_solved: &[RawRow],
    targets: &WoiTargets,
) -> Vec<RawRow> {
    actual_hq
        .iter()
        .map(|r| {
            let opening = r.closing;
            let sell_out = dealer_solved
                .iter()
                .rev()
                .find(|d| d.key == r.key)
                .map(|d| d.sell_in)
                .unwrap_or(ZERO_SERIES);
            let solution = solve_leaf(
                opening,
                series_total(&sell_out),
                &r.sell_in,
                targets.for_key(r.key),
            );
            solved_row(r.key, opening, sell_out, solution)
        })
        .collect()
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

    #[test]
    fn test_round_half_up_matches_js_math_round() {
        assert_eq!(round_half_up(dec!(2.5)), dec!(3));
        assert_eq!(round_half_up(dec!(2.49)), dec!(2));
        assert_eq!(round_half_up(dec!(-2.5)), dec!(-2));
        assert_eq!(round_half_up(dec!(-2.51)), dec!(-3));
    }

    #[test]
    fn test_target_closing_zero_without_demand() {
        assert_eq!(target_closing(Decimal::ZERO, dec!(30)), Decimal::ZERO);
        assert_eq!(target_closing(dec!(-52), dec!(30)), Decimal::ZERO);
    }

    #[test]
    fn test_even_split_december_takes_remainder() {
        let months = distribute_over_months(dec!(43), &ZERO_SERIES);
        assert_eq!(&months[..11], &[dec!(3); 11]);
        assert_eq!(months[11], dec!(10));
    }

    #[test]
    fn test_proportional_split_december_absorbs_drift() {
        let shape = [
            dec!(1), dec!(1), dec!(1), dec!(0), dec!(0), dec!(0),
            dec!(0), dec!(0), dec!(0), dec!(0), dec!(0), dec!(0),
        ];
        // 10 / 3 = 3.33.. → 3 each, December picks up the lost unit
        let months = distribute_over_months(dec!(10), &shape);
        assert_eq!(months[0], dec!(3));
        assert_eq!(months[1], dec!(3));
        assert_eq!(months[2], dec!(3));
        assert_eq!(months[11], dec!(1));
        assert_eq!(series_total(&months), dec!(10));
    }

    #[test]
    fn test_proportional_split_can_push_december_negative() {
        // Rounding up in every month overshoots; December gives it back.
        let shape = [
            dec!(1), dec!(1), dec!(1), dec!(1), dec!(1), dec!(1),
            dec!(1), dec!(1), dec!(1), dec!(1), dec!(1), dec!(0),
        ];
        let months = distribute_over_months(dec!(6), &shape);
        assert_eq!(months[0], dec!(1)); // 6/11 = 0.545 → 1
        assert_eq!(months[11], dec!(-5));
        assert_eq!(series_total(&months), dec!(6));
    }

    #[test]
    fn test_non_positive_requirement_is_all_zero() {
        assert_eq!(distribute_over_months(Decimal::ZERO, &flat(dec!(5))), ZERO_SERIES);
        assert_eq!(distribute_over_months(dec!(-7), &flat(dec!(5))), ZERO_SERIES);
    }

    #[test]
    fn test_out_of_range_scale_falls_back_to_even_split() {
        let mut shape = ZERO_SERIES;
        shape[0] = Decimal::new(1, 27);
        // 1e12 / 1e-27 does not fit in a Decimal
        let months = distribute_over_months(dec!(1_000_000_000_000), &shape);
        assert_eq!(months[0], dec!(83_333_333_333));
        assert_eq!(series_total(&months), dec!(1_000_000_000_000));
    }

    #[test]
    fn test_solve_at_the_decimal_limit_does_not_panic() {
        let sol = solve_leaf(Decimal::ZERO, Decimal::MAX, &ZERO_SERIES, dec!(52));
        assert_eq!(sol.required_sell_in, Decimal::MAX);
        assert_eq!(series_total(&sol.sell_in), Decimal::MAX);

        let actual = vec![RawRow {
            key: AccountKey::Bags,
            opening: dec!(0),
            sell_in: ZERO_SERIES,
            sell_out: [Decimal::MAX; 12],
            closing: dec!(0),
            woi_sell_out: None,
        }];
        let solved = solve_dealer_target(&actual, &WoiTargets::uniform(dec!(4)), dec!(50));
        assert_eq!(solved[0].sell_out, [Decimal::MAX; 12]);
    }

    #[test]
    fn test_woi_targets_per_category() {
        let t = WoiTargets {
            clothing: dec!(20),
            accessory: dec!(40),
        };
        assert_eq!(t.for_key(AccountKey::NextSeason), dec!(20));
        assert_eq!(t.for_key(AccountKey::Shoes), dec!(40));
    }

    #[test]
    fn test_woi_targets_deserialize_uniform_or_split() {
        let uniform: WoiTargets = serde_json::from_str("12").unwrap();
        assert_eq!(uniform, WoiTargets::uniform(dec!(12)));
        let split: WoiTargets =
            serde_json::from_str(r#"{"clothing": 20, "accessory": 35}"#).unwrap();
        assert_eq!(split.clothing, dec!(20));
        assert_eq!(split.accessory, dec!(35));
    }

    #[test]
    fn test_solver_config_defaults() {
        let cfg: SolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.dealer_target, WoiTargets::uniform(dec!(30)));
        assert_eq!(cfg.hq_target, WoiTargets::uniform(dec!(10)));
        assert_eq!(cfg.growth_rate_pct, dec!(5));
    }

    #[test]
    fn test_growth_scales_and_rounds_sell_out() {
        let actual = vec![RawRow {
            key: AccountKey::Hats,
            opening: dec!(0),
            sell_in: flat(dec!(1)),
            sell_out: flat(dec!(7)),
            closing: dec!(10),
            woi_sell_out: None,
        }];
        let solved = solve_dealer_target(&actual, &WoiTargets::uniform(dec!(4)), dec!(10));
        // 7 × 1.1 = 7.7 → 8
        assert_eq!(solved[0].sell_out, flat(dec!(8)));
        assert_eq!(solved[0].opening, dec!(10));
    }

    #[test]
    fn test_hq_without_dealer_row_has_no_demand() {
        let hq = vec![RawRow {
            key: AccountKey::Bags,
            opening: dec!(0),
            sell_in: flat(dec!(2)),
            sell_out: flat(dec!(2)),
            closing: dec!(30),
            woi_sell_out: Some(flat(dec!(3))),
        }];
        let solved = solve_hq_target(&hq, &[], &WoiTargets::uniform(dec!(10)));
        assert_eq!(solved[0].sell_out, ZERO_SERIES);
        assert_eq!(solved[0].sell_in, ZERO_SERIES);
        assert_eq!(solved[0].closing, Decimal::ZERO);
        assert_eq!(solved[0].woi_sell_out, None);
    }
}
