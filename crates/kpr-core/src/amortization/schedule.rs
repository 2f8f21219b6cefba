//! Multi-segment annuity schedule.
//!
//! Each rate segment re-anchors the annuity: at the start of a segment the
//! level payment is recomputed from the balance carried over, the segment's
//! rate and the instalments left until the last segment ends. The payment is
//! not a single figure fixed over the whole tenor, so the numbers match the
//! instalments quoted to applicants on the KPR detail and simulation screens.
//!
//! All math in `rust_decimal::Decimal`; nothing is rounded mid-calculation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::segment::{validate_segments, LoanSegment};
use crate::error::KprError;
use crate::time_value::{annuity_payment, monthly_rate};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Period};
use crate::KprResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Residual balance above which a finished schedule is reported as not fully
/// amortized.
const BALANCE_EPSILON: Decimal = dec!(0.01);

const PERIODS_PER_YEAR: Period = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One instalment of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: Period,
    pub principal_component: Money,
    pub interest_component: Money,
    /// Level payment of the segment this instalment belongs to
    pub payment: Money,
    pub remaining_balance: Money,
    pub applied_annual_rate_percent: Percent,
}

/// Input for an enveloped schedule computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    /// Loan amount after down payment
    pub principal: Money,
    /// Rate segments, sorted and contiguous from period 1
    pub segments: Vec<LoanSegment>,
    /// Total tenor in months; when set the segments must end on it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenor_periods: Option<Period>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub rows: Vec<ScheduleRow>,
    pub summary: ScheduleSummary,
    pub segment_summaries: Vec<SegmentSummary>,
    pub yearly: Vec<YearlyRollup>,
}

/// Totals across the whole schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub period_count: usize,
    pub total_payment: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    pub final_balance: Money,
    pub first_payment: Money,
    pub last_payment: Money,
}

/// The instalment and balances for one rate segment that produced rows.
/// `monthly_payment` amortizes `opening_balance` at this segment's rate over
/// every instalment left in the loan, not just the segment's own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub start_period: Period,
    pub end_period: Period,
    pub annual_rate_percent: Percent,
    pub monthly_payment: Money,
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub interest_paid: Money,
}

/// Instalments grouped by loan year (periods 1-12 are year 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRollup {
    pub year: u32,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub total_paid: Money,
    pub closing_balance: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the period-by-period schedule for `principal` across `segments`.
///
/// Segments are processed in the order given. A segment with no instalments,
/// or reached with nothing left to repay, emits no rows. Segments that do not
/// cover the full tenor simply end the schedule early. This function never
/// fails; use [`compute_schedule`] for validated input.
pub fn build_schedule(principal: Money, segments: &[LoanSegment]) -> Vec<ScheduleRow> {
    amortize(principal, segments).0
}

/// Validate the segment sequence, build the schedule and attach summaries.
pub fn compute_schedule(
    input: &ScheduleInput,
) -> KprResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(KprError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative".into(),
        });
    }
    validate_segments(&input.segments, input.tenor_periods)?;

    let output = schedule_output(input.principal, &input.segments, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Segmented annuity amortization, payment re-anchored at each rate segment",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "segments": input.segments.len(),
            "tenor_periods": input.tenor_periods,
            "rate_convention": "annual percent / 100 / 12 per month",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Build rows plus summaries without validation. Shared with the simulation
/// module, which lays its segments out itself.
pub(crate) fn schedule_output(
    principal: Money,
    segments: &[LoanSegment],
    warnings: &mut Vec<String>,
) -> ScheduleOutput {
    let (rows, segment_summaries) = amortize(principal, segments);
    let summary = summarize(&rows);

    if rows.is_empty() {
        warnings.push("Schedule is empty: nothing to amortize".into());
    } else if summary.final_balance > BALANCE_EPSILON {
        warnings.push(format!(
            "Balance of {} remains after period {}",
            summary.final_balance.round_dp(2),
            rows.last().map(|r| r.period).unwrap_or_default()
        ));
    }

    let yearly = yearly_rollup(&rows);
    ScheduleOutput {
        rows,
        summary,
        segment_summaries,
        yearly,
    }
}

/// Aggregate totals for a built schedule.
pub fn summarize(rows: &[ScheduleRow]) -> ScheduleSummary {
    let total_principal: Money = rows.iter().map(|r| r.principal_component).sum();
    let total_interest: Money = rows.iter().map(|r| r.interest_component).sum();
    let total_payment: Money = rows.iter().map(|r| r.payment).sum();

    ScheduleSummary {
        period_count: rows.len(),
        total_payment,
        total_principal,
        total_interest,
        final_balance: rows.last().map(|r| r.remaining_balance).unwrap_or(Decimal::ZERO),
        first_payment: rows.first().map(|r| r.payment).unwrap_or(Decimal::ZERO),
        last_payment: rows.last().map(|r| r.payment).unwrap_or(Decimal::ZERO),
    }
}

/// Group rows into loan years.
pub fn yearly_rollup(rows: &[ScheduleRow]) -> Vec<YearlyRollup> {
    let mut years: Vec<YearlyRollup> = Vec::new();

    for row in rows {
        let year = (row.period.saturating_sub(1)) / PERIODS_PER_YEAR + 1;
        match years.last_mut() {
            Some(current) if current.year == year => {
                current.principal_paid += row.principal_component;
                current.interest_paid += row.interest_component;
                current.total_paid += row.payment;
                current.closing_balance = row.remaining_balance;
            }
            _ => years.push(YearlyRollup {
                year,
                principal_paid: row.principal_component,
                interest_paid: row.interest_component,
                total_paid: row.payment,
                closing_balance: row.remaining_balance,
            }),
        }
    }

    years
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn amortize(principal: Money, segments: &[LoanSegment]) -> (Vec<ScheduleRow>, Vec<SegmentSummary>) {
    let mut rows: Vec<ScheduleRow> = Vec::new();
    let mut summaries: Vec<SegmentSummary> = Vec::new();
    let mut balance = principal;
    let last_end = segments.iter().map(|s| s.end_period).max().unwrap_or(0);

    for seg in segments {
        let count = seg.period_count();
        if count <= 0 || balance <= Decimal::ZERO {
            debug!(
                start_period = seg.start_period,
                end_period = seg.end_period,
                %balance,
                "skipping rate segment"
            );
            continue;
        }
        // Both bounded by end_period, so they fit
        let n = count as u32;
        let remaining = (i64::from(last_end) - i64::from(seg.start_period) + 1).max(count) as u32;

        let r = monthly_rate(seg.annual_rate_percent);
        let payment = match annuity_payment(balance, r, remaining) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "annuity payment undefined, using straight-line");
                balance / Decimal::from(remaining)
            }
        };

        let opening_balance = balance;
        let mut interest_paid = Decimal::ZERO;

        for offset in 0..n {
            let interest = balance * r;
            let principal_component = (payment - interest).max(Decimal::ZERO);
            balance = (balance - principal_component).max(Decimal::ZERO);
            interest_paid += interest;

            rows.push(ScheduleRow {
                period: seg.start_period + offset,
                principal_component,
                interest_component: interest,
                payment,
                remaining_balance: balance,
                applied_annual_rate_percent: seg.annual_rate_percent,
            });
        }

        summaries.push(SegmentSummary {
            start_period: seg.start_period,
            end_period: seg.end_period,
            annual_rate_percent: seg.annual_rate_percent,
            monthly_payment: payment,
            opening_balance,
            closing_balance: balance,
            interest_paid,
        });
    }

    (rows, summaries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_segment_fully_amortizes() {
        let rows = build_schedule(dec!(100_000), &[LoanSegment::new(1, 360, dec!(6))]);
        assert_eq!(rows.len(), 360);
        let last = rows.last().unwrap();
        assert!(last.remaining_balance < dec!(0.000001), "residual {}", last.remaining_balance);
        assert!((rows[0].payment - dec!(599.55)).abs() < dec!(0.01));
        // First month interest: 100,000 * 0.005
        assert_eq!(rows[0].interest_component, dec!(500));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let rows = build_schedule(dec!(1200), &[LoanSegment::new(1, 12, dec!(0))]);
        assert_eq!(rows.len(), 12);
        for row in &rows {
            assert_eq!(row.principal_component, dec!(100));
            assert_eq!(row.interest_component, Decimal::ZERO);
        }
        assert_eq!(rows[11].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_payment_reanchored_per_segment() {
        let segs = [
            LoanSegment::new(1, 12, dec!(5)),
            LoanSegment::new(13, 120, dec!(10)),
        ];
        let rows = build_schedule(dec!(500_000), &segs);
        let carried = rows[11].remaining_balance;
        let expected = annuity_payment(carried, monthly_rate(dec!(10)), 108).unwrap();
        assert_eq!(rows[12].payment, expected);
        assert_ne!(rows[0].payment, rows[12].payment);
    }

    #[test]
    fn test_first_segment_annuity_spans_whole_loan() {
        let segs = [
            LoanSegment::new(1, 12, dec!(5.99)),
            LoanSegment::new(13, 240, dec!(13.5)),
        ];
        let rows = build_schedule(dec!(680_000_000), &segs);
        assert_eq!(rows.len(), 240);
        let expected = annuity_payment(dec!(680_000_000), monthly_rate(dec!(5.99)), 240).unwrap();
        assert_eq!(rows[0].payment, expected);
        assert!(rows[11].remaining_balance > dec!(600_000_000));
        assert_eq!(rows[12].applied_annual_rate_percent, dec!(13.5));
    }

    #[test]
    fn test_zero_principal_yields_no_rows() {
        assert!(build_schedule(Decimal::ZERO, &[LoanSegment::new(1, 12, dec!(5))]).is_empty());
        assert!(build_schedule(dec!(-10), &[LoanSegment::new(1, 12, dec!(5))]).is_empty());
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let segs = [
            LoanSegment::new(1, 12, dec!(5)),
            LoanSegment::new(20, 19, dec!(7)),
            LoanSegment::new(13, 24, dec!(6)),
        ];
        let rows = build_schedule(dec!(10_000), &segs);
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.applied_annual_rate_percent != dec!(7)));
    }

    #[test]
    fn test_uncovered_tenor_ends_early() {
        let rows = build_schedule(dec!(10_000), &[LoanSegment::new(1, 12, dec!(5))]);
        assert_eq!(rows.len(), 12);
    }

    #[test]
    fn test_summary_totals_reconcile() {
        let rows = build_schedule(dec!(250_000), &[LoanSegment::new(1, 120, dec!(7.5))]);
        let s = summarize(&rows);
        assert_eq!(s.period_count, 120);
        assert!((s.total_principal - dec!(250_000)).abs() < dec!(0.0001));
        assert!((s.total_payment - (s.total_principal + s.total_interest)).abs() < dec!(0.0001));
        assert_eq!(s.first_payment, s.last_payment);
    }

    #[test]
    fn test_yearly_rollup_groups_by_twelve() {
        let rows = build_schedule(dec!(120_000), &[LoanSegment::new(1, 30, dec!(0))]);
        let years = yearly_rollup(&rows);
        assert_eq!(years.len(), 3);
        assert_eq!(years[0].principal_paid, dec!(48_000));
        assert_eq!(years[2].principal_paid, dec!(24_000));
        assert_eq!(years[2].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_compute_schedule_rejects_gap() {
        let input = ScheduleInput {
            principal: dec!(100_000),
            segments: vec![
                LoanSegment::new(1, 12, dec!(5)),
                LoanSegment::new(14, 24, dec!(6)),
            ],
            tenor_periods: None,
        };
        assert!(matches!(
            compute_schedule(&input).unwrap_err(),
            KprError::InvalidSegmentSequence { .. }
        ));
    }

    #[test]
    fn test_compute_schedule_rejects_negative_principal() {
        let input = ScheduleInput {
            principal: dec!(-1),
            segments: vec![LoanSegment::new(1, 12, dec!(5))],
            tenor_periods: None,
        };
        assert!(matches!(
            compute_schedule(&input).unwrap_err(),
            KprError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_compute_schedule_envelope() {
        let input = ScheduleInput {
            principal: dec!(100_000),
            segments: vec![
                LoanSegment::new(1, 24, dec!(4.5)),
                LoanSegment::new(25, 60, dec!(9)),
            ],
            tenor_periods: Some(60),
        };
        let out = compute_schedule(&input).unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        assert_eq!(out.result.rows.len(), 60);
        assert_eq!(out.result.segment_summaries.len(), 2);
        assert_eq!(out.result.yearly.len(), 5);
        assert_eq!(
            out.result.segment_summaries[0].closing_balance,
            out.result.segment_summaries[1].opening_balance
        );
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_compute_schedule_zero_principal_warns() {
        let input = ScheduleInput {
            principal: Decimal::ZERO,
            segments: vec![LoanSegment::new(1, 12, dec!(5))],
            tenor_periods: Some(12),
        };
        let out = compute_schedule(&input).unwrap();
        assert!(out.result.rows.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }
}
