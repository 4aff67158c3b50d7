use serde_json::Value;

/// Print just the key answer from the output.
///
/// A payoff summary prints as `months total_paid total_interest` on one
/// line; otherwise falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", minimal_line(result_obj));
}

fn minimal_line(result: &Value) -> String {
    let Value::Object(map) = result else {
        return format_minimal(result);
    };

    let summary_keys = ["months", "total_paid", "total_interest"];
    let fields: Vec<String> = summary_keys
        .iter()
        .filter_map(|k| map.get(*k))
        .map(format_minimal)
        .collect();
    if fields.len() == summary_keys.len() {
        return fields.join(" ");
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
