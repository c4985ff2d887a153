use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanId;

/// one expected monthly installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub payment_day: NaiveDate,
    /// expected payment for the period, rewritten when overpayments re-spread
    pub amount: Money,
    pub paid_amount: Money,
    pub is_paid: bool,
}

impl PaymentSchedule {
    pub fn new(loan_id: LoanId, payment_day: NaiveDate, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            payment_day,
            amount,
            paid_amount: Money::ZERO,
            is_paid: false,
        }
    }

    /// amount still owed on this installment
    pub fn outstanding(&self) -> Money {
        if self.is_paid {
            return Money::ZERO;
        }
        (self.amount - self.paid_amount).max(Money::ZERO)
    }

    /// true when the installment falls due in the given year/month
    pub fn is_due_in(&self, year: i32, month: u32) -> bool {
        self.payment_day.year() == year && self.payment_day.month() == month
    }

    /// apply up to `available` toward this installment, returning what was taken
    pub fn apply(&mut self, available: Money) -> Money {
        let applied = available.min(self.outstanding());
        self.paid_amount += applied;
        if self.paid_amount >= self.amount {
            self.is_paid = true;
        }
        applied
    }

    /// mark fully paid regardless of what was received
    pub fn settle(&mut self) {
        self.paid_amount = self.amount;
        self.is_paid = true;
    }

    /// overwrite the expected amount after a re-spread
    ///
    /// never drops below what was already received.
    pub fn reschedule(&mut self, new_amount: Money) {
        self.amount = new_amount.max(self.paid_amount);
        if self.paid_amount.is_positive() && self.paid_amount >= self.amount {
            self.is_paid = true;
        }
    }
}
