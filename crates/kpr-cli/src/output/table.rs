use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar_text;

/// Format output as tables using the tabled crate. Scalar fields of the
/// result go in a field/value table; arrays of records (schedule rows,
/// yearly rollups, segment summaries) each get their own table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_object(map),
        },
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(map) => print_object(map),
        Value::Array(arr) => print_records(arr),
        other => println!("{}", other),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&str, &Value)> = Vec::new();
    let mut scalars = 0;

    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => nested.push((key.as_str(), val)),
            Value::Object(_) => nested.push((key.as_str(), val)),
            _ => {
                builder.push_record([key.as_str(), scalar_text(val).as_str()]);
                scalars += 1;
            }
        }
    }

    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, val) in nested {
        println!("\n{}:", key);
        match val {
            Value::Array(arr) => print_records(arr),
            Value::Object(inner) => print_object(inner),
            _ => {}
        }
    }
}

fn print_records(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        if arr.is_empty() {
            println!("(empty)");
        }
        for item in arr {
            println!("{}", scalar_text(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}", Table::from(builder));
}
