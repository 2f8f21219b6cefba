use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::KprError;
use crate::types::{Money, Percent, Rate};
use crate::KprResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Convert an annual percentage rate (5.99 = 5.99% p.a.) into the monthly
/// decimal rate used for instalment maths.
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / PERCENT / MONTHS_PER_YEAR
}

/// Present value of 1 received `periods` periods from now, i.e. `(1 + r)^-n`.
///
/// Returns zero when `(1 + r)^n` no longer fits in a Decimal, which is the
/// limit the true value tends to anyway.
pub fn discount_factor(periodic_rate: Rate, periods: u32) -> Decimal {
    match (Decimal::ONE + periodic_rate).checked_powu(u64::from(periods)) {
        Some(factor) if !factor.is_zero() => Decimal::ONE / factor,
        _ => Decimal::ZERO,
    }
}

/// Level payment that amortizes `balance` over `periods` at `periodic_rate`.
///
/// `r == 0` degenerates to straight-line repayment.
pub fn annuity_payment(balance: Money, periodic_rate: Rate, periods: u32) -> KprResult<Money> {
    if periods == 0 {
        return Err(KprError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    let n = Decimal::from(periods);
    if periodic_rate.is_zero() {
        return Ok(balance / n);
    }

    let denominator = Decimal::ONE - discount_factor(periodic_rate, periods);
    if denominator.is_zero() {
        return Err(KprError::DivisionByZero {
            context: "annuity payment denominator".into(),
        });
    }

    Ok(balance * periodic_rate / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate_from_percent() {
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
        assert_eq!(monthly_rate(dec!(0)), dec!(0));
    }

    #[test]
    fn test_annuity_payment_textbook() {
        // 100,000 over 360 months at 6% p.a. ≈ 599.55
        let pmt = annuity_payment(dec!(100_000), monthly_rate(dec!(6)), 360).unwrap();
        assert!((pmt - dec!(599.55)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_annuity_payment_zero_rate_is_straight_line() {
        let pmt = annuity_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_annuity_payment_zero_periods_rejected() {
        let err = annuity_payment(dec!(1000), dec!(0.01), 0).unwrap_err();
        assert!(matches!(err, KprError::InvalidInput { .. }));
    }

    #[test]
    fn test_discount_factor_single_period() {
        assert_eq!(discount_factor(dec!(0.25), 1), dec!(0.8));
    }
}
