//! Fixed-EMI loan payoff simulator.
//!
//! Capitalises interest on the running balance each month, then deducts the
//! EMI (or the whole remaining balance in the final month). Two guards run
//! before any iteration: every parameter must be strictly positive, and the
//! EMI must exceed the first month's interest on the original principal.
//! Once the second guard holds the balance strictly decreases every month,
//! so the loop always terminates.
//!
//! Rust callers get the typed outcome from [`try_simulate`]. The legacy
//! surface [`simulate`] collapses both guard failures into the `-1`
//! sentinel of [`PayoffResult`].

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::schedule::PayoffPeriods;
use crate::error::PayoffError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Decimal places kept on the reported totals.
const OUTPUT_DP: u32 = 1;

/// Payoff horizons beyond this many months are flagged.
const LONG_HORIZON_MONTHS: u32 = 360;

/// A final instalment smaller than this fraction of the EMI is flagged.
const SMALL_FINAL_PAYMENT_RATIO: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Initial balance owed.
    pub principal: Money,
    /// Interest per month as a fraction (0.02 = 2%).
    pub monthly_rate: Rate,
    /// Fixed amount paid each month (the EMI).
    pub payment: Money,
}

impl LoanParameters {
    pub fn new(principal: Money, monthly_rate: Rate, payment: Money) -> Self {
        Self {
            principal,
            monthly_rate,
            payment,
        }
    }

    /// Build parameters from floating-point inputs, rejecting NaN, infinities
    /// and values outside the decimal range.
    pub fn from_f64(principal: f64, monthly_rate: f64, payment: f64) -> CalcResult<Self> {
        Ok(Self {
            principal: decimal_from_f64("principal", principal)?,
            monthly_rate: decimal_from_f64("monthly_rate", monthly_rate)?,
            payment: decimal_from_f64("payment", payment)?,
        })
    }

    /// Interest accrued in the first month on the original principal.
    pub fn first_interest(&self) -> CalcResult<Money> {
        self.principal
            .checked_mul(self.monthly_rate)
            .ok_or_else(|| PayoffError::InvalidInput {
                field: "principal".into(),
                reason: "Principal times monthly rate exceeds the decimal range".into(),
            })
    }
}

/// Successful payoff, totals rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffSummary {
    pub months: u32,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Legacy result shape: either a valid payoff or `-1` in every field.
///
/// Fields are private so a partially-sentinel value cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayoffResult {
    months: i64,
    total_paid: Money,
    total_interest: Money,
}

impl PayoffResult {
    pub const SENTINEL: PayoffResult = PayoffResult {
        months: -1,
        total_paid: Decimal::NEGATIVE_ONE,
        total_interest: Decimal::NEGATIVE_ONE,
    };

    /// Project a typed outcome onto the legacy shape. Every error becomes the
    /// sentinel; the cause is intentionally not recoverable from the result.
    pub fn from_outcome(outcome: &CalcResult<PayoffSummary>) -> Self {
        match outcome {
            Ok(summary) => Self::from(*summary),
            Err(_) => Self::SENTINEL,
        }
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    pub fn total_paid(&self) -> Money {
        self.total_paid
    }

    pub fn total_interest(&self) -> Money {
        self.total_interest
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl From<PayoffSummary> for PayoffResult {
    fn from(summary: PayoffSummary) -> Self {
        Self {
            months: i64::from(summary.months),
            total_paid: summary.total_paid,
            total_interest: summary.total_interest,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the payoff and report the legacy sentinel on any failure.
pub fn simulate(principal: Money, monthly_rate: Rate, payment: Money) -> PayoffResult {
    let params = LoanParameters::new(principal, monthly_rate, payment);
    PayoffResult::from_outcome(&try_simulate(&params))
}

/// Same as [`simulate`], for callers holding floating-point inputs.
pub fn simulate_f64(principal: f64, monthly_rate: f64, payment: f64) -> PayoffResult {
    let outcome = LoanParameters::from_f64(principal, monthly_rate, payment)
        .and_then(|params| try_simulate(&params));
    PayoffResult::from_outcome(&outcome)
}

/// Simulate the payoff, reporting which guard rejected the input on failure.
pub fn try_simulate(params: &LoanParameters) -> CalcResult<PayoffSummary> {
    let totals = run(params)?;
    Ok(totals.summary)
}

/// Payoff summary wrapped in the standard computation envelope.
pub fn calculate_payoff(
    params: &LoanParameters,
) -> CalcResult<ComputationOutput<PayoffSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let totals = run(params)?;

    if totals.summary.months > LONG_HORIZON_MONTHS {
        warnings.push(format!(
            "Payoff takes {} months (over {} years); EMI barely exceeds interest",
            totals.summary.months,
            LONG_HORIZON_MONTHS / 12
        ));
    }
    if totals.summary.months > 1
        && totals.final_payment < params.payment * SMALL_FINAL_PAYMENT_RATIO
    {
        warnings.push(format!(
            "Final instalment {} is under 1% of the EMI",
            round_output(totals.final_payment)
        ));
    }

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    let assumptions = serde_json::json!({
        "interest_capitalisation": "monthly, before payment",
        "final_period": "pays remaining balance when below EMI",
        "rounding": "totals rounded half-up to 1 dp after accumulation",
    });

    Ok(with_metadata(
        "Fixed-EMI Payoff Simulation",
        &assumptions,
        warnings,
        elapsed,
        totals.summary,
    ))
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Run both guards. On success the payoff loop is guaranteed to terminate.
pub(crate) fn guard(params: &LoanParameters) -> CalcResult<()> {
    validate_input(params)?;
    check_convergence(params)
}

fn validate_input(params: &LoanParameters) -> CalcResult<()> {
    let fields = [
        ("principal", params.principal),
        ("monthly_rate", params.monthly_rate),
        ("payment", params.payment),
    ];
    for (field, value) in fields {
        if value <= Decimal::ZERO {
            debug!(field, %value, "rejecting non-positive loan parameter");
            return Err(PayoffError::InvalidInput {
                field: field.into(),
                reason: format!("Must be positive, got {value}"),
            });
        }
    }
    Ok(())
}

fn check_convergence(params: &LoanParameters) -> CalcResult<()> {
    let first_interest = params.first_interest()?;
    if params.payment <= first_interest {
        debug!(
            payment = %params.payment,
            %first_interest,
            "rejecting non-convergent loan"
        );
        return Err(PayoffError::NonConvergent {
            payment: params.payment,
            first_interest,
        });
    }
    // Largest balance the loop ever holds: principal plus one month's interest.
    if params.principal.checked_add(first_interest).is_none() {
        return Err(PayoffError::InvalidInput {
            field: "principal".into(),
            reason: "Principal plus first-month interest exceeds the decimal range".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Totals {
    summary: PayoffSummary,
    final_payment: Money,
}

fn run(params: &LoanParameters) -> CalcResult<Totals> {
    guard(params)?;

    let (months, total_paid, final_payment) = PayoffPeriods::new(params).try_fold(
        (0u32, Decimal::ZERO, Decimal::ZERO),
        |(months, paid, _), period| -> CalcResult<(u32, Money, Money)> {
            let months = months.checked_add(1).ok_or_else(|| PayoffError::InvalidInput {
                field: "payment".into(),
                reason: format!("Payoff exceeds {} months", u32::MAX),
            })?;
            Ok((months, add_to_total(paid, period.payment)?, period.payment))
        },
    )?;
    let total_interest = total_paid - params.principal;

    let summary = PayoffSummary {
        months,
        total_paid: round_output(total_paid),
        total_interest: round_output(total_interest),
    };
    debug!(
        months,
        total_paid = %summary.total_paid,
        total_interest = %summary.total_interest,
        "loan paid off"
    );

    Ok(Totals {
        summary,
        final_payment,
    })
}

/// Add one month's payment to the running total. Valid loans can pay several
/// times the principal, so the total may leave the decimal range even when
/// every balance fits.
pub(crate) fn add_to_total(total_paid: Money, payment: Money) -> CalcResult<Money> {
    total_paid
        .checked_add(payment)
        .ok_or_else(|| PayoffError::InvalidInput {
            field: "principal".into(),
            reason: "Total paid over the loan exceeds the decimal range".into(),
        })
}

/// Round half-up to the output precision. Applied once, after accumulation.
pub(crate) fn round_output(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(OUTPUT_DP, RoundingStrategy::MidpointAwayFromZero)
}

fn decimal_from_f64(field: &str, value: f64) -> CalcResult<Decimal> {
    if !value.is_finite() {
        return Err(PayoffError::InvalidInput {
            field: field.into(),
            reason: format!("{value} is not a finite number"),
        });
    }
    let decimal = Decimal::from_f64(value).ok_or_else(|| PayoffError::InvalidInput {
        field: field.into(),
        reason: format!("{value} is outside the decimal range"),
    })?;
    // Decimal keeps 28 fractional digits; anything smaller would silently become 0.
    if value > 0.0 && decimal.is_zero() {
        return Err(PayoffError::InvalidInput {
            field: field.into(),
            reason: format!("{value} is below decimal precision (28 places)"),
        });
    }
    Ok(decimal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(principal: Decimal, rate: Decimal, payment: Decimal) -> LoanParameters {
        LoanParameters::new(principal, rate, payment)
    }

    #[test]
    fn test_phone_loan_six_months() {
        // Balances: 8100, 6181, 4242.81, 2285.2381, 308.090481, then
        // 308.090481 * 1.01 = 311.17138581 paid in full in month 6.
        let summary = try_simulate(&params(dec!(10000), dec!(0.01), dec!(2000))).unwrap();
        assert_eq!(
            summary,
            PayoffSummary {
                months: 6,
                total_paid: dec!(10311.2),
                total_interest: dec!(311.2),
            }
        );
    }

    #[test]
    fn test_payment_below_first_interest_is_non_convergent() {
        let err = try_simulate(&params(dec!(10000), dec!(0.05), dec!(400))).unwrap_err();
        match err {
            PayoffError::NonConvergent {
                payment,
                first_interest,
            } => {
                assert_eq!(payment, dec!(400));
                assert_eq!(first_interest, dec!(500));
            }
            other => panic!("Expected NonConvergent, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_equal_to_first_interest_is_non_convergent() {
        let err = try_simulate(&params(dec!(10000), dec!(0.05), dec!(500))).unwrap_err();
        assert!(matches!(err, PayoffError::NonConvergent { .. }));
    }

    #[test]
    fn test_negative_principal_rejected() {
        let err = try_simulate(&params(dec!(-5), dec!(0.01), dec!(100))).unwrap_err();
        match err {
            PayoffError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_rate_rejected() {
        let err = try_simulate(&params(dec!(1000), Decimal::ZERO, dec!(100))).unwrap_err();
        match err {
            PayoffError::InvalidInput { field, .. } => assert_eq!(field, "monthly_rate"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_payment_reported_as_invalid_not_non_convergent() {
        let err = try_simulate(&params(dec!(1000), dec!(0.01), Decimal::ZERO)).unwrap_err();
        match err {
            PayoffError::InvalidInput { field, .. } => assert_eq!(field, "payment"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_balance_equal_to_payment_takes_full_payment() {
        // 100 * 1.01 = 101, which is not below the EMI of 101.
        let summary = try_simulate(&params(dec!(100), dec!(0.01), dec!(101))).unwrap();
        assert_eq!(summary.months, 1);
        assert_eq!(summary.total_paid, dec!(101.0));
        assert_eq!(summary.total_interest, dec!(1.0));
    }

    #[test]
    fn test_balance_just_below_payment_pays_remainder() {
        let summary = try_simulate(&params(dec!(100), dec!(0.01), dec!(101.5))).unwrap();
        assert_eq!(summary.months, 1);
        assert_eq!(summary.total_paid, dec!(101.0));
    }

    #[test]
    fn test_legacy_sentinel_for_both_failures() {
        assert_eq!(
            simulate(dec!(10000), dec!(0.05), dec!(400)),
            PayoffResult::SENTINEL
        );
        assert_eq!(simulate(dec!(-5), dec!(0.01), dec!(100)), PayoffResult::SENTINEL);
        assert!(simulate(dec!(0), dec!(0.01), dec!(100)).is_sentinel());
    }

    #[test]
    fn test_legacy_result_carries_summary() {
        let result = simulate(dec!(10000), dec!(0.01), dec!(2000));
        assert!(!result.is_sentinel());
        assert_eq!(result.months(), 6);
        assert_eq!(result.total_paid(), dec!(10311.2));
        assert_eq!(result.total_interest(), dec!(311.2));
    }

    #[test]
    fn test_f64_boundary_rejects_non_finite() {
        assert!(simulate_f64(f64::NAN, 0.01, 100.0).is_sentinel());
        assert!(simulate_f64(1000.0, f64::INFINITY, 100.0).is_sentinel());
        assert!(simulate_f64(1000.0, 0.01, f64::NEG_INFINITY).is_sentinel());
    }

    #[test]
    fn test_f64_boundary_simulates() {
        let result = simulate_f64(10000.0, 0.01, 2000.0);
        assert_eq!(result.months(), 6);
        assert_eq!(result.total_paid(), dec!(10311.2));
    }

    #[test]
    fn test_f64_below_decimal_precision_rejected() {
        let err = LoanParameters::from_f64(1e-30, 0.01, 1.0).unwrap_err();
        match err {
            PayoffError::InvalidInput { field, reason } => {
                assert_eq!(field, "principal");
                assert!(reason.contains("below decimal precision"));
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_f64_smallest_representable_accepted() {
        let params = LoanParameters::from_f64(1e-20, 0.01, 1.0).unwrap();
        assert!(params.principal > Decimal::ZERO);
        assert_eq!(try_simulate(&params).unwrap().months, 1);
    }

    #[test]
    fn test_total_paid_overflow_rejected() {
        let err = add_to_total(Decimal::MAX, Decimal::ONE).unwrap_err();
        match err {
            PayoffError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_overflowing_principal_rejected() {
        let err = try_simulate(&params(Decimal::MAX, dec!(2), Decimal::MAX)).unwrap_err();
        assert!(matches!(err, PayoffError::InvalidInput { .. }));
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(round_output(dec!(10.25)), dec!(10.3));
        assert_eq!(round_output(dec!(10.24)), dec!(10.2));
        assert_eq!(round_output(dec!(-0.05)), dec!(-0.1));
    }

    #[test]
    fn test_envelope_metadata() {
        let output = calculate_payoff(&params(dec!(10000), dec!(0.01), dec!(2000))).unwrap();
        assert_eq!(output.result.months, 6);
        assert_eq!(output.methodology, "Fixed-EMI Payoff Simulation");
        assert!(output.warnings.is_empty());
        assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_long_horizon_warning() {
        // 1% monthly on 10k is 100 interest; an EMI of 101 takes decades.
        let output = calculate_payoff(&params(dec!(10000), dec!(0.01), dec!(101))).unwrap();
        assert!(output.result.months > LONG_HORIZON_MONTHS);
        assert!(output.warnings.iter().any(|w| w.contains("months")));
    }

    #[test]
    fn test_small_final_payment_warning() {
        // Month 1 leaves 1010 - 1000.5 = 9.5; month 2 pays 9.595, under 10.005.
        let output =
            calculate_payoff(&params(dec!(1000), dec!(0.01), dec!(1000.5))).unwrap();
        assert_eq!(output.result.months, 2);
        assert!(output.warnings.iter().any(|w| w.contains("Final instalment")));
    }
}
