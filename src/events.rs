use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus};

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    SchedulesGenerated {
        loan_id: LoanId,
        installments: u32,
        monthly_payment: Money,
        first_due: NaiveDate,
    },
    LoanCompleted {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentApplied {
        loan_id: LoanId,
        amount: Money,
        applied_to_penalties: Money,
        applied_to_current_period: Money,
        remaining_amount: Money,
        timestamp: DateTime<Utc>,
    },
    InstallmentsRecalculated {
        loan_id: LoanId,
        old_payment: Money,
        new_payment: Money,
        unpaid_installments: u32,
        timestamp: DateTime<Utc>,
    },
    RefundIssued {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // penalty events
    PenaltyImposed {
        loan_id: LoanId,
        penalty_id: Uuid,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PenaltyPaid {
        loan_id: LoanId,
        penalty_id: Uuid,
        amount: Money,
        fully_paid: bool,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
