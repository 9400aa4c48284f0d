mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::assemble::AssembleArgs;
use commands::edit::{EditPlanArgs, EditWoiArgs};
use commands::plan::PlanArgs;
use commands::rollforward::RollForwardArgs;

/// Inventory roll-forward and target weeks-of-inventory planning
#[derive(Parser)]
#[command(
    name = "invplan",
    version,
    about = "Inventory roll-forward and target weeks-of-inventory planning",
    long_about = "A CLI for rolling dealer and HQ inventory forward month by month \
                  with decimal precision. Computes sell-through and weeks of inventory \
                  for every account, subtotal and total, solves next year's sell-in for \
                  a target WOI, and re-solves a snapshot after a single edit."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver and recalculation steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll forward actual dealer and HQ rows for a calendar year
    RollForward(RollForwardArgs),
    /// Solve next year's sell-in for the dealer and HQ target WOI
    Plan(PlanArgs),
    /// Build raw rows (and tables) from warehouse aggregates
    Assemble(AssembleArgs),
    /// Change one leaf's target WOI on a computed snapshot
    EditWoi(EditWoiArgs),
    /// Change an HQ leaf's annual sell-in or sell-out plan total
    EditPlan(EditPlanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    // stdout carries the result; logs go to stderr
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::RollForward(args) => commands::rollforward::run_roll_forward(args),
        Commands::Plan(args) => commands::plan::run_plan(args),
        Commands::Assemble(args) => commands::assemble::run_assemble(args),
        Commands::EditWoi(args) => commands::edit::run_edit_woi(args),
        Commands::EditPlan(args) => commands::edit::run_edit_plan(args),
        Commands::Version => {
            println!("invplan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
