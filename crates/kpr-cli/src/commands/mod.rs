pub mod schedule;
pub mod simulation;

use clap::ValueEnum;
use serde_json::{Map, Value};

/// Which part of a schedule computation to print.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum View {
    /// Whole envelope: rows, summaries, warnings, metadata
    #[default]
    Full,
    /// Headline figures only
    Summary,
    /// One line per instalment
    Rows,
    /// Totals per loan year
    Yearly,
    /// Instalment per rate segment
    Segments,
}

/// Narrow an enveloped schedule (or simulation) down to `view`.
pub fn project(envelope: Value, view: View) -> Value {
    let pick = |key: &str| -> Value {
        let result = envelope.get("result");
        result
            .and_then(|r| r.get("schedule"))
            .and_then(|s| s.get(key))
            .or_else(|| result.and_then(|r| r.get(key)))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()))
    };

    match view {
        View::Full => envelope.clone(),
        View::Rows => pick("rows"),
        View::Yearly => pick("yearly"),
        View::Segments => pick("segment_summaries"),
        View::Summary => {
            let mut headline = Map::new();
            if let Some(Value::Object(result)) = envelope.get("result") {
                for (k, v) in result {
                    if !v.is_array() && !v.is_object() {
                        headline.insert(k.clone(), v.clone());
                    }
                }
            }
            if let Value::Object(summary) = pick("summary") {
                headline.extend(summary);
            }
            let mut out = envelope.clone();
            if let Value::Object(ref mut map) = out {
                map.insert("result".into(), Value::Object(headline));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn simulation_envelope() -> Value {
        json!({
            "result": {
                "principal": "680000000",
                "segments": [{ "start_period": 1 }],
                "schedule": {
                    "rows": [{ "period": 1 }, { "period": 2 }],
                    "summary": { "total_interest": "10" },
                    "yearly": [],
                    "segment_summaries": []
                }
            },
            "warnings": []
        })
    }

    #[test]
    fn test_rows_view_reaches_into_simulation() {
        let rows = project(simulation_envelope(), View::Rows);
        assert_eq!(rows, json!([{ "period": 1 }, { "period": 2 }]));
    }

    #[test]
    fn test_summary_view_merges_headline_fields() {
        let out = project(simulation_envelope(), View::Summary);
        assert_eq!(
            out["result"],
            json!({ "principal": "680000000", "total_interest": "10" })
        );
        assert_eq!(out["warnings"], json!([]));
    }
}
