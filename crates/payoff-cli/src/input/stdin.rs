use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read loan parameters piped on stdin as JSON.
/// Returns None when stdin is a TTY or the pipe is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: T = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse stdin as loan JSON: {}", e))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use payoff_core::amortization::LoanParameters;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_pipe_is_none() {
        let parsed: Option<LoanParameters> = parse_piped("  \n").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_piped_loan() {
        let parsed: Option<LoanParameters> = parse_piped(
            r#"{"principal": "10000", "monthly_rate": "0.01", "payment": "2000"}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            Some(LoanParameters::new(dec!(10000), dec!(0.01), dec!(2000)))
        );
    }

    #[test]
    fn test_malformed_pipe_reports_source() {
        let err = parse_piped::<LoanParameters>(r#"{"principal": "10000"}"#).unwrap_err();
        assert!(err.to_string().contains("stdin"));
    }
}
