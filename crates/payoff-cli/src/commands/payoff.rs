use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use payoff_core::amortization::{self, LoanParameters, PayoffResult};

use crate::input;

/// Loan parameters shared by every payoff command
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal (initial balance owed)
    #[arg(long, allow_hyphen_values = true)]
    pub principal: Option<Decimal>,

    /// Monthly interest rate as a decimal (0.02 = 2%)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "annual_rate")]
    pub monthly_rate: Option<Decimal>,

    /// Annual interest rate as a decimal, converted to monthly by dividing by 12
    #[arg(long, allow_hyphen_values = true)]
    pub annual_rate: Option<Decimal>,

    /// Fixed monthly payment (EMI)
    #[arg(long, alias = "emi", allow_hyphen_values = true)]
    pub payment: Option<Decimal>,
}

/// Arguments for the payoff summary
#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Print the legacy result ({-1, -1, -1} on failure) instead of an error
    #[arg(long)]
    pub sentinel: bool,
}

/// Arguments for the month-by-month schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = resolve_params(&args.loan)?;

    if args.sentinel {
        let outcome = amortization::try_simulate(&params);
        if let Err(ref e) = outcome {
            tracing::info!(error = %e, "payoff rejected, reporting sentinel");
        }
        let legacy = PayoffResult::from_outcome(&outcome);
        return Ok(serde_json::json!({ "result": legacy }));
    }

    let result = amortization::calculate_payoff(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = resolve_params(&args.loan)?;
    let result = amortization::generate_schedule(&params)?;
    Ok(serde_json::to_value(result)?)
}

fn resolve_params(args: &LoanArgs) -> Result<LoanParameters, Box<dyn std::error::Error>> {
    let params: LoanParameters = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        let monthly_rate = match (args.monthly_rate, args.annual_rate) {
            (Some(rate), _) => rate,
            (None, Some(annual)) => annual / dec!(12),
            (None, None) => {
                return Err("--monthly-rate or --annual-rate is required (or provide --input)".into())
            }
        };
        LoanParameters {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            monthly_rate,
            payment: args.payment
                .ok_or("--payment is required (or provide --input)")?,
        }
    };

    tracing::debug!(
        principal = %params.principal,
        monthly_rate = %params.monthly_rate,
        payment = %params.payment,
        "resolved loan parameters"
    );
    Ok(params)
}
