pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Render a scalar for a table cell or CSV field.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The list of records a schedule-shaped value carries, if any: a bare array,
/// or `result.rows` / `result.schedule.rows` inside an envelope.
pub(crate) fn record_list(value: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(arr) = value {
        return Some(arr);
    }
    let result = value.get("result")?;
    result
        .get("rows")
        .or_else(|| result.get("schedule").and_then(|s| s.get("rows")))
        .and_then(Value::as_array)
}
