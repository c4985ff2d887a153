use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::types::{LoanId, LoanStatus};

/// point-in-time copy of a loan, used to undo a failed unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub timestamp: DateTime<Utc>,
    pub trigger: String,
    pub state: Loan,
}

impl LoanSnapshot {
    pub fn capture(loan: &Loan, trigger: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id: loan.id,
            timestamp,
            trigger: trigger.into(),
            state: loan.clone(),
        }
    }

    /// put the captured state back onto `loan`
    ///
    /// events emitted since the capture are dropped with the rest of the state.
    pub fn restore(&self, loan: &mut Loan) -> Result<()> {
        if loan.id != self.loan_id {
            return Err(LoanError::InvalidState {
                current: format!("loan {}", loan.id),
                expected: format!("loan {}", self.loan_id),
            });
        }

        *loan = self.state.clone();
        Ok(())
    }

    pub fn remaining_amount(&self) -> Money {
        self.state.remaining_amount
    }

    pub fn status(&self) -> LoanStatus {
        self.state.status
    }
}
