use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use kpr_core::amortization::{self, LoanSegment};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct RawScheduleInput {
    principal: Decimal,
    segments: Vec<LoanSegment>,
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

/// Bare schedule rows, as the detail view renders them. Never validates:
/// malformed segments produce fewer rows, not an error.
#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: RawScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rows = amortization::build_schedule(input.principal, &input.segments);
    serde_json::to_string(&rows).map_err(to_napi_error)
}

#[napi]
pub fn compute_schedule(input_json: String) -> NapiResult<String> {
    let input: amortization::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::compute_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn validate_segments(input_json: String, tenor_periods: Option<u32>) -> NapiResult<bool> {
    let segments: Vec<LoanSegment> = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    amortization::validate_segments(&segments, tenor_periods).map_err(to_napi_error)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_kpr(input_json: String) -> NapiResult<String> {
    let input: amortization::simulation::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::simulation::simulate_kpr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
