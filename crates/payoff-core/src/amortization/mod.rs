//! Loan payoff simulation: fixed-EMI amortization with a convergence guard.

pub mod schedule;
pub mod simulator;

pub use schedule::{amortization_schedule, generate_schedule, AmortizationSchedule, PayoffPeriod};
pub use simulator::{
    calculate_payoff, simulate, simulate_f64, try_simulate, LoanParameters, PayoffResult,
    PayoffSummary,
};
