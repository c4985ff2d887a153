use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// level monthly payment that amortizes `principal` over `months` periods
///
/// `annual_rate` is the nominal annual rate as a fraction. Zero periods means
/// nothing is left to schedule and yields zero; a zero rate spreads the
/// principal evenly. The result is rounded to cents. Terms whose compound
/// factor or payment exceed decimal range are rejected with `InvalidTerms`.
pub fn monthly_payment(principal: Money, annual_rate: Rate, months: u32) -> Result<Money> {
    if months == 0 || !principal.is_positive() {
        return Ok(Money::ZERO);
    }

    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        return Ok((principal / Decimal::from(months)).round_cents());
    }

    // payment = P * [r * (1 + r)^n / ((1 + r)^n - 1)]
    // the bracketed factor stays near r, so large principals do not overflow
    let compound = compound_factor(r, months).ok_or_else(|| out_of_range(principal, annual_rate, months))?;
    let factor = r
        .checked_mul(compound)
        .and_then(|scaled| scaled.checked_div(compound - Decimal::ONE))
        .ok_or_else(|| out_of_range(principal, annual_rate, months))?;
    let payment = principal
        .as_decimal()
        .checked_mul(factor)
        .ok_or_else(|| out_of_range(principal, annual_rate, months))?;

    Ok(Money::from_decimal(payment).round_cents())
}

/// (1 + r)^n by repeated multiplication, exact in decimal
fn compound_factor(r: Decimal, n: u32) -> Option<Decimal> {
    let base = Decimal::ONE.checked_add(r)?;
    let mut compound = Decimal::ONE;
    for _ in 0..n {
        compound = compound.checked_mul(base)?;
    }
    Some(compound)
}

fn out_of_range(principal: Money, annual_rate: Rate, months: u32) -> LoanError {
    LoanError::InvalidTerms {
        message: format!("{principal} at {annual_rate} over {months} months cannot be amortized"),
    }
}

/// add months to date, clamping the day to the end of the target month
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.year() as i64 * 12 + (date.month0() as i64) + months as i64;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = (total.rem_euclid(12) + 1) as u32;
    on_day_clamped(year, month, date.day())
}

/// the date in year/month carrying `day`, or the month's last day if shorter
pub fn on_day_clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// most recent billing day at or before `today`
///
/// billing days fall on `billing_day` of every month, clamped to short months.
pub fn last_due_date(billing_day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let this_month = on_day_clamped(today.year(), today.month(), billing_day)?;
    if this_month <= today {
        return Some(this_month);
    }

    let (year, month) = previous_month(today.year(), today.month());
    on_day_clamped(year, month, billing_day)
}

/// year and month of the installment currently being billed
///
/// before the billing day the current month's installment is open; from the
/// billing day on, the next month's installment is.
pub fn current_billing_month(billing_day: u32, today: NaiveDate) -> (i32, u32) {
    if today.day() < billing_day {
        (today.year(), today.month())
    } else {
        next_month(today.year(), today.month())
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_standard_amortization() {
        // 10,000 at 12% over 12 months
        let payment = monthly_payment(Money::from_major(10_000), Rate::from_percentage(12), 12).unwrap();
        assert_eq!(payment, Money::from_decimal(dec!(888.49)));
    }

    #[test]
    fn test_longer_term_lowers_payment() {
        let principal = Money::from_major(100_000);
        let rate = Rate::from_percentage(6);

        let short = monthly_payment(principal, rate, 120).unwrap();
        let long = monthly_payment(principal, rate, 360).unwrap();

        assert!(long < short);
        // 100k at 6% over 30 years
        assert_eq!(long, Money::from_decimal(dec!(599.55)));
    }

    #[test]
    fn test_zero_periods_is_zero() {
        let payment = monthly_payment(Money::from_major(5_000), Rate::from_percentage(10), 0).unwrap();
        assert_eq!(payment, Money::ZERO);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let payment = monthly_payment(Money::from_major(1_200), Rate::ZERO, 12).unwrap();
        assert_eq!(payment, Money::from_major(100));
    }

    #[test]
    fn test_large_principal_long_term_does_not_overflow() {
        // compound factor is about 7e20 at 100% over 50 years
        let payment = monthly_payment(Money::from_major(10_000_000_000), Rate::from_percentage(100), 600).unwrap();
        assert!(payment.is_positive());
        assert!(payment > Money::from_major(833_333_333));
        assert!(payment < Money::from_major(833_333_334));
    }

    #[test]
    fn test_out_of_range_terms_are_an_error() {
        let result = monthly_payment(Money::from_major(1_000), Rate::from_percentage(10_000), 600);
        assert!(matches!(result, Err(LoanError::InvalidTerms { .. })));

        let result = monthly_payment(Money::from_decimal(Decimal::MAX), Rate::from_percentage(12), 1);
        assert!(matches!(result, Err(LoanError::InvalidTerms { .. })));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2023, 1, 31), 1), Some(date(2023, 2, 28)));
        assert_eq!(add_months(date(2024, 1, 31), 2), Some(date(2024, 3, 31)));
        assert_eq!(add_months(date(2024, 11, 15), 3), Some(date(2025, 2, 15)));
    }

    #[test]
    fn test_last_due_date() {
        // billing on the 15th
        assert_eq!(last_due_date(15, date(2024, 6, 20)), Some(date(2024, 6, 15)));
        assert_eq!(last_due_date(15, date(2024, 6, 15)), Some(date(2024, 6, 15)));
        assert_eq!(last_due_date(15, date(2024, 6, 10)), Some(date(2024, 5, 15)));
        assert_eq!(last_due_date(15, date(2024, 1, 10)), Some(date(2023, 12, 15)));

        // billing on the 31st clamps in short months
        assert_eq!(last_due_date(31, date(2024, 2, 29)), Some(date(2024, 2, 29)));
        assert_eq!(last_due_date(31, date(2024, 3, 30)), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_current_billing_month() {
        assert_eq!(current_billing_month(15, date(2024, 6, 10)), (2024, 6));
        assert_eq!(current_billing_month(15, date(2024, 6, 15)), (2024, 7));
        assert_eq!(current_billing_month(15, date(2024, 12, 20)), (2025, 1));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
    }
}
