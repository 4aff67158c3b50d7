use serde_json::Value;
use std::io::{self, Write};

/// Print JSON to stdout: indented for a terminal, one line when piped so the
/// result can feed straight into another tool.
pub fn print_json(value: &Value) {
    let pretty = atty::is(atty::Stream::Stdout);
    let stdout = io::stdout();
    if let Err(e) = write_json(&mut stdout.lock(), value, pretty) {
        eprintln!("JSON serialization error: {}", e);
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_piped_output_is_single_line() {
        let value = json!({"result": {"months": 6, "total_paid": "10311.2"}});
        let mut buf = Vec::new();
        write_json(&mut buf, &value, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"total_paid\":\"10311.2\""));
    }

    #[test]
    fn test_terminal_output_is_indented() {
        let value = json!({"result": {"months": -1}});
        let mut buf = Vec::new();
        write_json(&mut buf, &value, true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().count() > 1);
        assert!(text.ends_with('\n'));
    }
}
