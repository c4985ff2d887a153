use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a client
pub type ClientId = Uuid;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoanStatus {
    /// application received, no decision yet
    #[default]
    Pending,
    /// approved, schedules generated, accepting payments
    Approved,
    /// declined at application time
    Rejected,
    /// fully repaid
    Completed,
}

impl LoanStatus {
    /// terminal states accept no further payments
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Completed)
    }

    pub fn can_accept_payment(&self) -> bool {
        !self.is_terminal()
    }

    /// human readable description
    pub fn display_string(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "Loan is Pending",
            LoanStatus::Approved => "Loan has been Approved",
            LoanStatus::Rejected => "Loan has been Rejected",
            LoanStatus::Completed => "Loan has been Completed",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_string())
    }
}

/// breakdown of where a single payment went
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentApplication {
    pub to_penalties: Money,
    pub to_current_period: Money,
    /// money absorbed by re-spreading the remaining installments
    pub to_future_periods: Money,
    pub settled: bool,
}

impl PaymentApplication {
    pub fn total_applied(&self) -> Money {
        self.to_penalties + self.to_current_period + self.to_future_periods
    }
}
