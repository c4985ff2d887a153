use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::decimal::Money;
use crate::penalty::Penalty;
use crate::schedule::PaymentSchedule;

use super::amortization::current_billing_month;

/// money taken by one penalty during the penalty pass
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyAllocation {
    pub penalty_id: Uuid,
    pub applied: Money,
    pub paid_off: bool,
}

/// apply `available` to unpaid penalties, oldest imposed first
///
/// returns the allocations made and the money left over.
pub fn allocate_to_penalties(
    penalties: &mut [Penalty],
    available: Money,
    now: DateTime<Utc>,
) -> (Vec<PenaltyAllocation>, Money) {
    let mut order: Vec<usize> = penalties
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_paid)
        .map(|(i, _)| i)
        .collect();
    order.sort_by_key(|&i| penalties[i].imposed_date);

    let mut remaining = available;
    let mut allocations = Vec::new();

    for i in order {
        if !remaining.is_positive() {
            break;
        }

        let penalty = &mut penalties[i];
        let applied = penalty.apply(remaining, now);
        remaining -= applied;

        allocations.push(PenaltyAllocation {
            penalty_id: penalty.id,
            applied,
            paid_off: penalty.is_paid,
        });
    }

    (allocations, remaining)
}

/// index of the unpaid installment billed in the current period
///
/// picks the earliest unpaid installment due in the current billing month.
pub fn current_installment(
    schedules: &[PaymentSchedule],
    billing_day: u32,
    today: NaiveDate,
) -> Option<usize> {
    let (year, month) = current_billing_month(billing_day, today);

    schedules
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_paid && s.is_due_in(year, month))
        .min_by_key(|(_, s)| s.payment_day)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::penalty::LATE_PAYMENT_REASON;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_oldest_penalty_paid_first() {
        let loan_id = Uuid::new_v4();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        // newer penalty listed first
        let mut penalties = vec![
            Penalty::new(loan_id, Money::from_major(50), LATE_PAYMENT_REASON, base + Duration::days(30)),
            Penalty::new(loan_id, Money::from_major(100), LATE_PAYMENT_REASON, base),
        ];

        let (allocations, left) = allocate_to_penalties(&mut penalties, Money::from_major(120), base);

        assert_eq!(left, Money::ZERO);
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].penalty_id, penalties[1].id);
        assert!(allocations[0].paid_off);
        assert_eq!(allocations[1].applied, Money::from_major(20));
        assert!(!allocations[1].paid_off);

        assert!(penalties[1].is_paid);
        assert_eq!(penalties[0].remaining_amount, Money::from_major(30));
    }

    #[test]
    fn test_penalty_pass_leaves_surplus() {
        let now = Utc::now();
        let mut penalties = vec![Penalty::new(Uuid::new_v4(), Money::from_major(100), "fee", now)];

        let (allocations, left) = allocate_to_penalties(&mut penalties, Money::from_major(150), now);

        assert_eq!(allocations.len(), 1);
        assert_eq!(left, Money::from_major(50));
    }

    #[test]
    fn test_paid_penalties_skipped() {
        let now = Utc::now();
        let mut paid = Penalty::new(Uuid::new_v4(), Money::from_major(10), "fee", now);
        paid.apply(Money::from_major(10), now);
        let mut penalties = vec![paid];

        let (allocations, left) = allocate_to_penalties(&mut penalties, Money::from_major(5), now);

        assert!(allocations.is_empty());
        assert_eq!(left, Money::from_major(5));
    }

    #[test]
    fn test_current_installment_selection() {
        let loan_id = Uuid::new_v4();
        let schedules = vec![
            PaymentSchedule::new(loan_id, date(2024, 2, 15), Money::from_major(100)),
            PaymentSchedule::new(loan_id, date(2024, 3, 15), Money::from_major(100)),
            PaymentSchedule::new(loan_id, date(2024, 4, 15), Money::from_major(100)),
        ];

        // before the billing day, this month's installment is open
        assert_eq!(current_installment(&schedules, 15, date(2024, 3, 10)), Some(1));
        // on or after it, next month's is
        assert_eq!(current_installment(&schedules, 15, date(2024, 3, 15)), Some(2));
        // nothing billed outside the schedule
        assert_eq!(current_installment(&schedules, 15, date(2024, 4, 20)), None);
    }

    #[test]
    fn test_current_installment_ignores_paid() {
        let loan_id = Uuid::new_v4();
        let mut schedules = vec![
            PaymentSchedule::new(loan_id, date(2024, 2, 15), Money::from_major(100)),
        ];
        schedules[0].settle();

        assert_eq!(current_installment(&schedules, 15, date(2024, 2, 1)), None);
    }
}
