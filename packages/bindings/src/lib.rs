use napi::Result as NapiResult;
use napi_derive::napi;

use inventory_plan_core::assembly::PeriodSources;
use inventory_plan_core::model::PeriodRaw;
use inventory_plan_core::planning::{self, EditInput, PlanInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Actual year
// ---------------------------------------------------------------------------

#[napi]
pub fn build_period_tables(input_json: String) -> NapiResult<String> {
    let input: PeriodRaw = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = planning::build_period_tables(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn assemble_period(input_json: String) -> NapiResult<String> {
    let input: PeriodSources = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = planning::assemble_and_build(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast year
// ---------------------------------------------------------------------------

#[napi]
pub fn plan_period(input_json: String) -> NapiResult<String> {
    let input: PlanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = planning::plan_period(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn apply_edit(input_json: String) -> NapiResult<String> {
    let input: EditInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = planning::apply_edit(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
