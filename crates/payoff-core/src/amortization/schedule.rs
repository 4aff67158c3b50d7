//! Month-by-month amortization schedule for a fixed-EMI loan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::trace;

use super::simulator::{add_to_total, guard, round_output, LoanParameters};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::{CalcResult, PayoffError};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One month of the payoff, in full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffPeriod {
    /// 1-based month number.
    pub month: u32,
    pub opening_balance: Money,
    /// Interest capitalised onto the opening balance.
    pub interest: Money,
    /// Amount paid: the EMI, or the whole capitalised balance in the last month.
    pub payment: Money,
    pub closing_balance: Money,
    /// True only for the month that clears the balance.
    pub is_final: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub periods: Vec<PayoffPeriod>,
    pub months: u32,
    /// Sum of all payments, unrounded.
    pub total_paid: Money,
    /// `total_paid - principal`, unrounded.
    pub total_interest: Money,
}

// ---------------------------------------------------------------------------
// Period iterator
// ---------------------------------------------------------------------------

/// Yields one [`PayoffPeriod`] per month until the balance reaches zero.
///
/// Only constructed after both guards pass, which bounds the iteration.
pub(crate) struct PayoffPeriods {
    remaining: Money,
    monthly_rate: Rate,
    payment: Money,
    month: u32,
}

impl PayoffPeriods {
    pub(crate) fn new(params: &LoanParameters) -> Self {
        Self {
            remaining: params.principal,
            monthly_rate: params.monthly_rate,
            payment: params.payment,
            month: 0,
        }
    }
}

impl Iterator for PayoffPeriods {
    type Item = PayoffPeriod;

    fn next(&mut self) -> Option<PayoffPeriod> {
        if self.remaining <= Decimal::ZERO {
            return None;
        }

        let opening_balance = self.remaining;
        let interest = opening_balance * self.monthly_rate;
        let accrued = opening_balance + interest;

        // Strict comparison: a balance exactly equal to the EMI takes the full EMI.
        let (payment, closing_balance) = if accrued < self.payment {
            (accrued, Decimal::ZERO)
        } else {
            (self.payment, accrued - self.payment)
        };

        self.month = self.month.saturating_add(1);
        self.remaining = closing_balance;

        trace!(
            month = self.month,
            %opening_balance,
            %interest,
            %payment,
            %closing_balance,
            "payoff period"
        );

        Some(PayoffPeriod {
            month: self.month,
            opening_balance,
            interest,
            payment,
            closing_balance,
            is_final: closing_balance <= Decimal::ZERO,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Full payoff schedule. Fails with the same errors as
/// [`try_simulate`](super::simulator::try_simulate).
pub fn amortization_schedule(params: &LoanParameters) -> CalcResult<AmortizationSchedule> {
    guard(params)?;

    let mut periods: Vec<PayoffPeriod> = Vec::new();
    let mut total_paid = Decimal::ZERO;
    for period in PayoffPeriods::new(params) {
        total_paid = add_to_total(total_paid, period.payment)?;
        periods.push(period);
    }
    let months = u32::try_from(periods.len()).map_err(|_| PayoffError::InvalidInput {
        field: "payment".into(),
        reason: format!("Payoff exceeds {} months", u32::MAX),
    })?;

    Ok(AmortizationSchedule {
        months,
        total_paid,
        total_interest: total_paid - params.principal,
        periods,
    })
}

/// Schedule wrapped in the standard computation envelope.
pub fn generate_schedule(
    params: &LoanParameters,
) -> CalcResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let schedule = amortization_schedule(params)?;

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    let assumptions = serde_json::json!({
        "principal": params.principal.to_string(),
        "monthly_rate": params.monthly_rate.to_string(),
        "payment": params.payment.to_string(),
        "rounded_total_paid": round_output(schedule.total_paid).to_string(),
        "rounded_total_interest": round_output(schedule.total_interest).to_string(),
    });

    Ok(with_metadata(
        "Fixed-EMI Amortization Schedule",
        &assumptions,
        Vec::new(),
        elapsed,
        schedule,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
