use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanId;

/// reason recorded on penalties imposed by the delinquency scan
pub const LATE_PAYMENT_REASON: &str = "Late payment penalty";

/// late fee owed on a loan, payable in parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub amount: Money,
    pub remaining_amount: Money,
    pub reason: String,
    pub imposed_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub is_paid: bool,
}

impl Penalty {
    pub fn new(
        loan_id: LoanId,
        amount: Money,
        reason: impl Into<String>,
        imposed_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            amount,
            remaining_amount: amount,
            reason: reason.into(),
            imposed_date,
            paid_date: None,
            is_paid: amount.is_zero(),
        }
    }

    /// apply up to `available`, returning the part taken
    ///
    /// the penalty is marked paid once nothing remains.
    pub fn apply(&mut self, available: Money, now: DateTime<Utc>) -> Money {
        if self.is_paid || !available.is_positive() {
            return Money::ZERO;
        }

        let applied = available.min(self.remaining_amount);
        self.remaining_amount -= applied;

        if self.remaining_amount.is_zero() {
            self.is_paid = true;
            self.paid_date = Some(now);
        }

        applied
    }
}
