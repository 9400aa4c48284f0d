use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use inventory_plan_core::model::{AccountKey, PeriodTables};
use inventory_plan_core::planning::{self, Edit, EditInput};
use inventory_plan_core::recalc::PlanEdit;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TierArg {
    Dealer,
    Hq,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlanField {
    SellIn,
    SellOut,
}

/// Arguments for a target-WOI edit on a computed snapshot
#[derive(Args)]
pub struct EditWoiArgs {
    /// Snapshot file: a table pair or the envelope printed by `plan`
    #[arg(long)]
    pub input: Option<String>,

    /// Year of the snapshot, when the envelope does not record it
    #[arg(long)]
    pub year: Option<i32>,

    /// Tier whose leaf is edited
    #[arg(long, value_enum)]
    pub tier: TierArg,

    /// Account key, e.g. `current-fall` or `shoes`
    #[arg(long)]
    pub key: AccountKey,

    /// New target weeks of inventory
    #[arg(long)]
    pub woi: Decimal,
}

/// Arguments for an HQ annual plan total edit on a computed snapshot
#[derive(Args)]
pub struct EditPlanArgs {
    /// Snapshot file: a table pair or the envelope printed by `plan`
    #[arg(long)]
    pub input: Option<String>,

    /// Year of the snapshot, when the envelope does not record it
    #[arg(long)]
    pub year: Option<i32>,

    /// Account key, e.g. `current-fall` or `shoes`
    #[arg(long)]
    pub key: AccountKey,

    /// Which annual total is replaced
    #[arg(long, value_enum)]
    pub field: PlanField,

    /// New annual total
    #[arg(long)]
    pub total: Decimal,
}

pub fn run_edit_woi(args: EditWoiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = read_snapshot(args.input.as_deref())?;
    let (year, tables) = split_snapshot(snapshot, args.year)?;
    let edit = match args.tier {
        TierArg::Dealer => Edit::DealerWoi {
            key: args.key,
            woi: args.woi,
        },
        TierArg::Hq => Edit::HqWoi {
            key: args.key,
            woi: args.woi,
        },
    };
    let result = planning::apply_edit(&EditInput { year, tables, edit })?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_edit_plan(args: EditPlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = read_snapshot(args.input.as_deref())?;
    let (year, tables) = split_snapshot(snapshot, args.year)?;
    let plan = match args.field {
        PlanField::SellIn => PlanEdit::SellIn(args.total),
        PlanField::SellOut => PlanEdit::SellOut(args.total),
    };
    let edit = Edit::HqPlan {
        key: args.key,
        plan,
    };
    let result = planning::apply_edit(&EditInput { year, tables, edit })?;
    Ok(serde_json::to_value(result)?)
}

fn read_snapshot(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json_value(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err("--input <snapshot.json> or stdin required for edits".into())
    }
}

/// Accept either bare tables or a full envelope, pulling the year from its assumptions.
fn split_snapshot(
    snapshot: Value,
    year: Option<i32>,
) -> Result<(i32, PeriodTables), Box<dyn std::error::Error>> {
    let recorded = snapshot
        .pointer("/assumptions/year")
        .and_then(Value::as_i64)
        .and_then(|y| i32::try_from(y).ok());
    let year = year
        .or(recorded)
        .ok_or("--year required when the snapshot does not record its year")?;

    let tables = match snapshot {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or_default()
        }
        other => other,
    };
    Ok((year, serde_json::from_value(tables)?))
}
