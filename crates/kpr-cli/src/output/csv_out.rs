use serde_json::Value;
use std::io;

use super::{record_list, scalar_text};

/// Write output as CSV to stdout. Schedules are written one instalment per
/// line; anything else as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(records) = record_list(value) {
        write_records(&mut wtr, records);
    } else {
        let fields = value
            .get("result")
            .and_then(Value::as_object)
            .or_else(|| value.as_object());
        match fields {
            Some(map) => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), scalar_text(val).as_str()]);
                }
            }
            None => {
                let _ = wtr.write_record([&scalar_text(value)]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        for item in records {
            let _ = wtr.write_record([&scalar_text(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in records {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
