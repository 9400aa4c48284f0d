use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use inventory_plan_core::planning::{self, PlanInput};
use inventory_plan_core::solver::WoiTargets;

use crate::input;

/// Arguments for a forecast-year target-WOI solve
#[derive(Args)]
pub struct PlanArgs {
    /// Path to JSON input file (prior-year actuals plus solver settings)
    #[arg(long)]
    pub input: Option<String>,

    /// Forecast year, overriding the one in the input
    #[arg(long)]
    pub year: Option<i32>,

    /// Dealer target weeks of inventory for every account
    #[arg(long)]
    pub dealer_woi: Option<Decimal>,

    /// HQ target weeks of inventory for every account
    #[arg(long)]
    pub hq_woi: Option<Decimal>,

    /// Sell-out growth over the prior year, in percent
    #[arg(long, allow_hyphen_values = true)]
    pub growth: Option<Decimal>,
}

pub fn run_plan(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut plan_input: PlanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for planning".into());
    };

    if let Some(year) = args.year {
        plan_input.year = year;
    }
    if let Some(weeks) = args.dealer_woi {
        plan_input.solver.dealer_target = WoiTargets::uniform(weeks);
    }
    if let Some(weeks) = args.hq_woi {
        plan_input.solver.hq_target = WoiTargets::uniform(weeks);
    }
    if let Some(pct) = args.growth {
        plan_input.solver.growth_rate_pct = pct;
    }

    let result = planning::plan_period(&plan_input)?;
    Ok(serde_json::to_value(result)?)
}
