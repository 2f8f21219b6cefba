use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use kpr_core::amortization::simulation::{self, RatePeriod, SimulationInput};

use super::{project, View};
use crate::input;

/// Arguments for a KPR simulation from property price and down payment
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Property price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment in percent of the price
    #[arg(long, alias = "dp", default_value = "20")]
    pub down_payment_percent: Decimal,

    /// Tenor in years
    #[arg(long)]
    pub tenor_years: Option<u32>,

    /// Rate periods as DURATION:RATE, comma-separated, where DURATION is
    /// e.g. "1y", "18m" or "rest" (e.g. "1y:5.99,rest:13.5")
    #[arg(long, value_delimiter = ',', value_parser = parse_rate_period)]
    pub rates: Option<Vec<RatePeriod>>,

    /// Part of the result to print
    #[arg(long, value_enum, default_value_t = View::Full)]
    pub view: View,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SimulationInput {
            property_price: args.price.ok_or("--price is required (or provide --input)")?,
            down_payment_percent: args.down_payment_percent,
            tenor_years: args
                .tenor_years
                .ok_or("--tenor-years is required (or provide --input)")?,
            rate_periods: args.rates.ok_or("--rates is required (or provide --input)")?,
        }
    };

    let result = simulation::simulate_kpr(&sim_input)?;
    Ok(project(serde_json::to_value(result)?, args.view))
}

/// Parse `1y:5.99`, `18m:7.25`, `2y6m:8` or `rest:13.5`.
pub fn parse_rate_period(s: &str) -> Result<RatePeriod, String> {
    let (duration, rate) = s
        .split_once(':')
        .ok_or_else(|| format!("'{s}': expected DURATION:RATE"))?;
    let annual_rate_percent: Decimal = rate
        .trim()
        .parse()
        .map_err(|e| format!("'{s}': bad rate: {e}"))?;

    let duration = duration.trim().to_ascii_lowercase();
    if duration == "rest" {
        return Ok(RatePeriod {
            years: None,
            months: None,
            annual_rate_percent,
        });
    }

    let mut years = None;
    let mut months = None;
    let mut digits = String::new();
    for c in duration.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'y' | 'm' => {
                let n: u32 = digits
                    .parse()
                    .map_err(|_| format!("'{s}': missing number before '{c}'"))?;
                digits.clear();
                if c == 'y' {
                    years = Some(n);
                } else {
                    months = Some(n);
                }
            }
            _ => return Err(format!("'{s}': unexpected '{c}' in duration")),
        }
    }
    if !digits.is_empty() || (years.is_none() && months.is_none()) {
        return Err(format!("'{s}': duration needs a y or m unit, or 'rest'"));
    }

    Ok(RatePeriod {
        years,
        months,
        annual_rate_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years_and_months() {
        let rp = parse_rate_period("2y6m:8").unwrap();
        assert_eq!(rp.years, Some(2));
        assert_eq!(rp.months, Some(6));
        assert_eq!(rp.annual_rate_percent, Decimal::from(8));
    }

    #[test]
    fn test_parse_rest() {
        let rp = parse_rate_period("rest:13.5").unwrap();
        assert!(rp.years.is_none() && rp.months.is_none());
    }

    #[test]
    fn test_parse_rejects_unitless_duration() {
        assert!(parse_rate_period("12:5").is_err());
        assert!(parse_rate_period("y:5").is_err());
        assert!(parse_rate_period("1w:5").is_err());
    }
}
