use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use kpr_core::amortization::{self, LoanSegment, ScheduleInput};

use super::{project, View};
use crate::input;

/// Arguments for a schedule built from explicit rate segments
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount after down payment
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Rate segments as START-END:RATE, comma-separated (e.g. "1-12:5.99,13-240:13.5")
    #[arg(long, value_delimiter = ',', value_parser = parse_segment)]
    pub segments: Option<Vec<LoanSegment>>,

    /// Tenor in months; the last segment must end on it
    #[arg(long)]
    pub tenor: Option<u32>,

    /// Part of the result to print
    #[arg(long, value_enum, default_value_t = View::Full)]
    pub view: View,
}

/// Arguments for checking a segment sequence without building a schedule
#[derive(Args)]
pub struct ValidateSegmentsArgs {
    /// Path to JSON/YAML input file with `segments` and optional `tenor_periods`
    #[arg(long)]
    pub input: Option<String>,

    /// Rate segments as START-END:RATE, comma-separated
    #[arg(long, value_delimiter = ',', value_parser = parse_segment)]
    pub segments: Option<Vec<LoanSegment>>,

    /// Tenor in months
    #[arg(long)]
    pub tenor: Option<u32>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScheduleInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            segments: args
                .segments
                .ok_or("--segments is required (or provide --input)")?,
            tenor_periods: args.tenor,
        }
    };

    tracing::debug!(
        principal = %schedule_input.principal,
        segments = schedule_input.segments.len(),
        "building schedule"
    );
    let result = amortization::compute_schedule(&schedule_input)?;
    Ok(project(serde_json::to_value(result)?, args.view))
}

pub fn run_validate_segments(args: ValidateSegmentsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (segments, tenor) = if let Some(ref path) = args.input {
        let value: Value = input::file::read_input(path)?;
        segments_from_value(value)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        segments_from_value(data)?
    } else {
        (
            args.segments
                .ok_or("--segments is required (or provide --input)")?,
            args.tenor,
        )
    };

    amortization::validate_segments(&segments, tenor)?;
    let covered: i64 = segments.iter().map(LoanSegment::period_count).sum();
    Ok(serde_json::json!({
        "valid": true,
        "segments": segments.len(),
        "periods_covered": covered,
    }))
}

fn segments_from_value(value: Value) -> Result<(Vec<LoanSegment>, Option<u32>), Box<dyn std::error::Error>> {
    let segments: Vec<LoanSegment> = serde_json::from_value(
        value.get("segments").cloned().ok_or("input must contain `segments`")?,
    )?;
    let tenor = value
        .get("tenor_periods")
        .and_then(Value::as_u64)
        .map(u32::try_from)
        .transpose()?;
    Ok((segments, tenor))
}

/// Parse `START-END:RATE`, e.g. `13-240:13.5`.
pub fn parse_segment(s: &str) -> Result<LoanSegment, String> {
    let (range, rate) = s
        .split_once(':')
        .ok_or_else(|| format!("'{s}': expected START-END:RATE"))?;
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| format!("'{s}': expected START-END before ':'"))?;

    let start: u32 = start
        .trim()
        .parse()
        .map_err(|e| format!("'{s}': bad start period: {e}"))?;
    let end: u32 = end
        .trim()
        .parse()
        .map_err(|e| format!("'{s}': bad end period: {e}"))?;
    let rate: Decimal = rate
        .trim()
        .parse()
        .map_err(|e| format!("'{s}': bad rate: {e}"))?;

    Ok(LoanSegment::new(start, end, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_parse_segment() {
        let seg = parse_segment("13-240:13.5").unwrap();
        assert_eq!(seg, LoanSegment::new(13, 240, Decimal::from_str("13.5").unwrap()));
    }

    #[test]
    fn test_parse_segment_rejects_garbage() {
        assert!(parse_segment("13:5").is_err());
        assert!(parse_segment("1-12").is_err());
        assert!(parse_segment("a-12:5").is_err());
        assert!(parse_segment("1-12:x").is_err());
    }

    #[test]
    fn test_segments_from_value() {
        let value = serde_json::json!({
            "segments": [{ "start_period": 1, "end_period": 12, "annual_rate_percent": "5" }],
            "tenor_periods": 12
        });
        let (segs, tenor) = segments_from_value(value).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(tenor, Some(12));
    }
}
