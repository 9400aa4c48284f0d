use clap::Args;
use serde_json::Value;

use inventory_plan_core::model::PeriodRaw;
use inventory_plan_core::planning;

use crate::input;

/// Arguments for an actual-year roll-forward
#[derive(Args)]
pub struct RollForwardArgs {
    /// Path to JSON input file (dealer and HQ raw rows)
    #[arg(long)]
    pub input: Option<String>,

    /// Calendar year, overriding the one in the input
    #[arg(long)]
    pub year: Option<i32>,
}

pub fn run_roll_forward(args: RollForwardArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut raw: PeriodRaw = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for roll-forward".into());
    };
    if let Some(year) = args.year {
        raw.year = year;
    }

    tracing::debug!(
        year = raw.year,
        dealer_rows = raw.dealer.len(),
        hq_rows = raw.hq.len(),
        "rolling forward actuals"
    );

    let result = planning::build_period_tables(&raw)?;
    Ok(serde_json::to_value(result)?)
}
