use serde_json::Value;

use super::scalar_text;

/// Fields worth printing on their own, most useful first.
const PRIORITY_KEYS: [&str; 6] = [
    "monthly_payment",
    "first_payment",
    "principal",
    "total_interest",
    "total_payment",
    "final_balance",
];

/// Print just the headline number: the first instalment of a schedule, or
/// the first well-known field of the result.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);

    let summary = result
        .get("summary")
        .or_else(|| result.get("schedule").and_then(|s| s.get("summary")))
        .unwrap_or(result);

    for obj in [summary, result] {
        if let Value::Object(map) = obj {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                    println!("{}", scalar_text(val));
                    return;
                }
            }
        }
    }

    match result {
        Value::Object(map) => {
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, scalar_text(val));
            }
        }
        Value::Array(arr) => println!("{} rows", arr.len()),
        other => println!("{}", scalar_text(other)),
    }
}
