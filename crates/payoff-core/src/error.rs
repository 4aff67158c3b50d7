use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayoffError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Non-convergent loan: payment {payment} does not exceed first-month interest {first_interest}")]
    NonConvergent {
        payment: Decimal,
        first_interest: Decimal,
    },
}
