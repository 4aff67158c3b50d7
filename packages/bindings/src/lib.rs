use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::prelude::ToPrimitive;

use payoff_core::amortization::{self, LoanParameters};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Legacy numeric surface
// ---------------------------------------------------------------------------

/// Plain-number payoff result; every field is -1 when the loan is rejected.
#[napi(object)]
pub struct EmiResult {
    pub months: i64,
    pub total_paid: f64,
    pub total_interest: f64,
}

#[napi]
pub fn calculate_emi(principal: f64, monthly_rate: f64, emi: f64) -> EmiResult {
    let result = amortization::simulate_f64(principal, monthly_rate, emi);
    EmiResult {
        months: result.months(),
        total_paid: result.total_paid().to_f64().unwrap_or(f64::NAN),
        total_interest: result.total_interest().to_f64().unwrap_or(f64::NAN),
    }
}

// ---------------------------------------------------------------------------
// JSON surface
// ---------------------------------------------------------------------------

#[napi]
pub fn payoff_summary(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::calculate_payoff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::generate_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
