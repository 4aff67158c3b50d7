pub mod amortization;
pub mod error;
pub mod types;

pub use error::PayoffError;
pub use types::*;

/// Standard result type for all payoff operations
pub type CalcResult<T> = Result<T, PayoffError>;
