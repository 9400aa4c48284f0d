use clap::Args;
use serde_json::Value;

use inventory_plan_core::assembly::{self, PeriodSources};
use inventory_plan_core::planning;

use crate::input;

/// Arguments for building tables from warehouse aggregates
#[derive(Args)]
pub struct AssembleArgs {
    /// Path to JSON input file (stock, retail, shipment and purchase series)
    #[arg(long)]
    pub input: Option<String>,

    /// Print the assembled raw rows instead of rolling them forward
    #[arg(long)]
    pub raw: bool,
}

pub fn run_assemble(args: AssembleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sources: PeriodSources = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for assembly".into());
    };

    if args.raw {
        return Ok(serde_json::to_value(assembly::assemble_period(&sources))?);
    }
    let result = planning::assemble_and_build(&sources)?;
    Ok(serde_json::to_value(result)?)
}
