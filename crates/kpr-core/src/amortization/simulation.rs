//! KPR simulation: property price, down payment and tenor in, instalment
//! schedule out.
//!
//! Rate periods are quoted in years or months ("fixed 5.99% for 1 year, then
//! floating 13.5%") and laid out back to back from the first instalment. A
//! final period without a duration runs to the end of the tenor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::{schedule_output, ScheduleOutput};
use super::segment::LoanSegment;
use crate::error::KprError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Period};
use crate::KprResult;

const MAX_TENOR_YEARS: u32 = 50;
const PERCENT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Property price
    pub property_price: Money,
    /// Down payment as percent of the price (20 = 20%)
    pub down_payment_percent: Percent,
    /// Loan tenor in years
    pub tenor_years: u32,
    /// Rate periods in repayment order
    pub rate_periods: Vec<RatePeriod>,
}

/// A quoted rate period. Duration is `years * 12 + months`; leave both unset
/// on the last period to run it to the end of the tenor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatePeriod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
    pub annual_rate_percent: Percent,
}

impl RatePeriod {
    fn duration_months(&self) -> Option<Period> {
        match (self.years, self.months) {
            (None, None) => None,
            (y, m) => Some(
                y.unwrap_or(0)
                    .saturating_mul(12)
                    .saturating_add(m.unwrap_or(0)),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub property_price: Money,
    pub down_payment: Money,
    pub principal: Money,
    pub tenor_periods: Period,
    pub segments: Vec<LoanSegment>,
    pub schedule: ScheduleOutput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the loan amount from price and down payment, lay the rate periods
/// out over the tenor and build the schedule.
pub fn simulate_kpr(input: &SimulationInput) -> KprResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let down_payment = (input.property_price * input.down_payment_percent / PERCENT).normalize();
    let principal = (input.property_price - down_payment).normalize();
    let tenor_periods = input.tenor_years * 12;

    let segments = lay_out_segments(&input.rate_periods, tenor_periods, &mut warnings)?;
    let schedule = schedule_output(principal, &segments, &mut warnings);

    let output = SimulationOutput {
        property_price: input.property_price,
        down_payment,
        principal,
        tenor_periods,
        segments,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "KPR simulation: segmented annuity on price less down payment",
        &serde_json::json!({
            "property_price": input.property_price.to_string(),
            "down_payment_percent": input.down_payment_percent.to_string(),
            "tenor_years": input.tenor_years,
            "rate_periods": input.rate_periods.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Turn quoted rate periods into contiguous segments covering
/// `1..=tenor_periods`.
pub fn lay_out_segments(
    periods: &[RatePeriod],
    tenor_periods: Period,
    warnings: &mut Vec<String>,
) -> KprResult<Vec<LoanSegment>> {
    let mut segments = Vec::with_capacity(periods.len());
    let mut next_start: Period = 1;

    for (i, rp) in periods.iter().enumerate() {
        if next_start > tenor_periods {
            warnings.push(format!(
                "Rate period {} starts after the tenor and was ignored",
                i + 1
            ));
            continue;
        }

        let months = match rp.duration_months() {
            Some(0) => {
                return Err(KprError::InvalidInput {
                    field: format!("rate_periods[{i}]"),
                    reason: "Duration must be at least one month".into(),
                })
            }
            Some(m) => m,
            None if i + 1 == periods.len() => tenor_periods - next_start + 1,
            None => {
                return Err(KprError::InvalidInput {
                    field: format!("rate_periods[{i}]"),
                    reason: "Only the last rate period may omit its duration".into(),
                })
            }
        };

        let mut end = next_start.saturating_add(months - 1);
        if end > tenor_periods {
            warnings.push(format!(
                "Rate period {} truncated from {} to {} months to fit the tenor",
                i + 1,
                months,
                tenor_periods - next_start + 1
            ));
            end = tenor_periods;
        }

        segments.push(LoanSegment::new(next_start, end, rp.annual_rate_percent));
        next_start = end + 1;
    }

    if next_start <= tenor_periods {
        return Err(KprError::InvalidInput {
            field: "rate_periods".into(),
            reason: format!(
                "Rate periods cover {} of {} months",
                next_start - 1,
                tenor_periods
            ),
        });
    }

    Ok(segments)
}

fn validate_input(input: &SimulationInput) -> KprResult<()> {
    if input.property_price <= Decimal::ZERO {
        return Err(KprError::InvalidInput {
            field: "property_price".into(),
            reason: "Property price must be positive".into(),
        });
    }
    if input.down_payment_percent < Decimal::ZERO || input.down_payment_percent >= PERCENT {
        return Err(KprError::InvalidInput {
            field: "down_payment_percent".into(),
            reason: "Down payment must be between 0% and 100% (exclusive)".into(),
        });
    }
    if input.tenor_years == 0 || input.tenor_years > MAX_TENOR_YEARS {
        return Err(KprError::InvalidInput {
            field: "tenor_years".into(),
            reason: format!("Tenor must be between 1 and {MAX_TENOR_YEARS} years"),
        });
    }
    if input.rate_periods.is_empty() {
        return Err(KprError::InvalidInput {
            field: "rate_periods".into(),
            reason: "At least one rate period is required".into(),
        });
    }
    if let Some(i) = input
        .rate_periods
        .iter()
        .position(|rp| rp.annual_rate_percent < Decimal::ZERO)
    {
        return Err(KprError::InvalidInput {
            field: format!("rate_periods[{i}].annual_rate_percent"),
            reason: "Rate cannot be negative".into(),
        });
    }
    Ok(())
}
