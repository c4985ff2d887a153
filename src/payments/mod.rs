pub mod allocation;
pub mod amortization;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanId;

pub use allocation::{allocate_to_penalties, current_installment, PenaltyAllocation};
pub use amortization::monthly_payment;

/// immutable record of money received against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub payment_date: DateTime<Utc>,
    pub amount: Money,
}

impl Payment {
    pub fn new(loan_id: LoanId, amount: Money, payment_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            payment_date,
            amount,
        }
    }
}
