//! Rate segments: contiguous spans of instalments sharing one fixed rate.
//!
//! A KPR loan is quoted as a sequence of fixed-rate periods (e.g. 5.99% for
//! the first year, then a floating 13.5%). Each period becomes a
//! [`LoanSegment`] covering a closed range of one-based instalment numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::KprError;
use crate::types::{Percent, Period};
use crate::KprResult;

/// A closed range of instalments `[start_period, end_period]` at one rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSegment {
    /// First instalment covered (one-based)
    pub start_period: Period,
    /// Last instalment covered, inclusive
    pub end_period: Period,
    /// Annual rate in percent (5.99 = 5.99% p.a.)
    pub annual_rate_percent: Percent,
}

impl LoanSegment {
    pub fn new(start_period: Period, end_period: Period, annual_rate_percent: Percent) -> Self {
        Self {
            start_period,
            end_period,
            annual_rate_percent,
        }
    }

    /// Number of instalments in the segment. Zero or negative for a
    /// degenerate range.
    pub fn period_count(&self) -> i64 {
        i64::from(self.end_period) - i64::from(self.start_period) + 1
    }
}

/// Check that `segments` are sorted, contiguous, non-overlapping and start at
/// period 1. When `tenor_periods` is given, the last segment must end exactly
/// on it.
pub fn validate_segments(segments: &[LoanSegment], tenor_periods: Option<Period>) -> KprResult<()> {
    let Some(first) = segments.first() else {
        return Err(KprError::InvalidSegmentSequence {
            index: 0,
            reason: "At least one rate segment is required".into(),
        });
    };

    for (index, seg) in segments.iter().enumerate() {
        if seg.start_period < 1 {
            return Err(KprError::InvalidSegmentSequence {
                index,
                reason: "start_period must be >= 1".into(),
            });
        }
        if seg.end_period < seg.start_period {
            return Err(KprError::InvalidSegmentSequence {
                index,
                reason: format!(
                    "end_period {} precedes start_period {}",
                    seg.end_period, seg.start_period
                ),
            });
        }
        if seg.annual_rate_percent < Decimal::ZERO {
            return Err(KprError::InvalidSegmentSequence {
                index,
                reason: "annual_rate_percent cannot be negative".into(),
            });
        }
    }

    if first.start_period != 1 {
        return Err(KprError::InvalidSegmentSequence {
            index: 0,
            reason: format!("First segment starts at period {}, expected 1", first.start_period),
        });
    }

    for (index, pair) in segments.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let expected = prev.end_period.saturating_add(1);
        if next.start_period != expected {
            let kind = if next.start_period < expected {
                "overlaps"
            } else {
                "leaves a gap after"
            };
            return Err(KprError::InvalidSegmentSequence {
                index: index + 1,
                reason: format!(
                    "Segment starting at period {} {} the segment ending at period {}",
                    next.start_period, kind, prev.end_period
                ),
            });
        }
    }

    if let Some(tenor) = tenor_periods {
        let last_index = segments.len() - 1;
        let last_end = segments[last_index].end_period;
        if last_end != tenor {
            return Err(KprError::InvalidSegmentSequence {
                index: last_index,
                reason: format!("Segments end at period {last_end} but the tenor is {tenor} periods"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_step() -> Vec<LoanSegment> {
        vec![
            LoanSegment::new(1, 12, dec!(5.99)),
            LoanSegment::new(13, 240, dec!(13.5)),
        ]
    }

    #[test]
    fn test_period_count() {
        assert_eq!(LoanSegment::new(13, 240, dec!(1)).period_count(), 228);
        assert_eq!(LoanSegment::new(5, 5, dec!(1)).period_count(), 1);
        assert_eq!(LoanSegment::new(6, 5, dec!(1)).period_count(), 0);
    }

    #[test]
    fn test_contiguous_segments_pass() {
        assert!(validate_segments(&two_step(), Some(240)).is_ok());
        assert!(validate_segments(&two_step(), None).is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        let err = validate_segments(&[], None).unwrap_err();
        assert!(matches!(err, KprError::InvalidSegmentSequence { index: 0, .. }));
    }

    #[test]
    fn test_gap_rejected() {
        let segs = vec![
            LoanSegment::new(1, 12, dec!(5)),
            LoanSegment::new(14, 24, dec!(6)),
        ];
        match validate_segments(&segs, None).unwrap_err() {
            KprError::InvalidSegmentSequence { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("gap"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_overlap_rejected() {
        let segs = vec![
            LoanSegment::new(1, 12, dec!(5)),
            LoanSegment::new(12, 24, dec!(6)),
        ];
        match validate_segments(&segs, None).unwrap_err() {
            KprError::InvalidSegmentSequence { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("overlaps"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_must_start_at_one() {
        let segs = vec![LoanSegment::new(2, 12, dec!(5))];
        assert!(validate_segments(&segs, None).is_err());
    }

    #[test]
    fn test_tenor_mismatch_rejected() {
        let err = validate_segments(&two_step(), Some(180)).unwrap_err();
        assert!(matches!(err, KprError::InvalidSegmentSequence { index: 1, .. }));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let segs = vec![LoanSegment::new(1, 12, dec!(-1))];
        assert!(validate_segments(&segs, None).is_err());
    }

    #[test]
    fn test_reversed_range_rejected() {
        let segs = vec![LoanSegment::new(1, 0, dec!(5))];
        assert!(validate_segments(&segs, None).is_err());
    }
}
