use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::Client;
use crate::decimal::Money;
use crate::errors::Result;
use crate::loan::Loan;
use crate::payments::Payment;
use crate::penalty::Penalty;
use crate::types::{ClientId, LoanId};

/// loan persistence
///
/// updates are version checked: the stored loan must carry the same
/// `version` as the one being written, otherwise the write is rejected with
/// a concurrency conflict.
pub trait LoanRepository {
    fn add_loan(&mut self, loan: Loan) -> Result<()>;

    fn get_loan(&self, id: LoanId) -> Result<Loan>;

    /// store `loan`, returning the new version
    fn update_loan(&mut self, loan: &Loan) -> Result<u64>;

    fn all_loans(&self) -> Result<Vec<Loan>>;

    fn loans_for_client(&self, client_id: ClientId) -> Result<Vec<Loan>> {
        Ok(self
            .all_loans()?
            .into_iter()
            .filter(|loan| loan.client_id == client_id)
            .collect())
    }
}

/// append-only payment log
pub trait PaymentRepository {
    fn append_payment(&mut self, payment: Payment) -> Result<()>;

    fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>>;

    /// drop a payment appended by a unit of work that later failed
    fn retract_payment(&mut self, payment_id: Uuid) -> Result<()>;
}

/// penalty persistence
pub trait PenaltyRepository {
    fn add_penalty(&mut self, penalty: Penalty) -> Result<()>;

    fn get_penalty(&self, id: Uuid) -> Result<Penalty>;

    fn update_penalty(&mut self, penalty: &Penalty) -> Result<()>;
}

pub trait ClientRepository {
    fn add_client(&mut self, client: Client) -> Result<()>;

    fn get_client(&self, id: ClientId) -> Result<Client>;
}

/// everything the loan service persists
pub trait LedgerStore: LoanRepository + PaymentRepository + PenaltyRepository + ClientRepository {}

impl<T> LedgerStore for T where T: LoanRepository + PaymentRepository + PenaltyRepository + ClientRepository {}

/// decides whether an application is approved
pub trait LoanApprovalPolicy {
    fn is_approved(&self, client: &Client, loan: &Loan) -> bool;
}

/// approves every application
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAll;

impl LoanApprovalPolicy for ApproveAll {
    fn is_approved(&self, _client: &Client, _loan: &Loan) -> bool {
        true
    }
}

/// decides whether a client may borrow at all
pub trait ClientEligibility {
    fn is_eligible(&self, client: &Client, today: chrono::NaiveDate) -> bool;
}

/// eligible from a minimum age
#[derive(Debug, Clone, Copy)]
pub struct MinimumAge {
    pub years: u32,
}

impl Default for MinimumAge {
    fn default() -> Self {
        Self { years: 18 }
    }
}

impl ClientEligibility for MinimumAge {
    fn is_eligible(&self, client: &Client, today: chrono::NaiveDate) -> bool {
        client.is_eligible_for_loan(today, self.years)
    }
}

/// assigns a credit score at registration
pub trait CreditScoreStrategy {
    fn score(&self, client: &Client) -> Decimal;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedCreditScore(pub Decimal);

impl Default for FixedCreditScore {
    fn default() -> Self {
        Self(Decimal::from(600))
    }
}

impl CreditScoreStrategy for FixedCreditScore {
    fn score(&self, _client: &Client) -> Decimal {
        self.0
    }
}

/// money returned to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub loan_id: LoanId,
    pub amount: Money,
    pub issued_at: DateTime<Utc>,
}

/// sends excess money back to the client
pub trait RefundSink {
    fn send_back(&mut self, refund: Refund) -> Result<()>;
}

/// records refunds and logs them
#[derive(Debug, Clone, Default)]
pub struct LoggingRefundSink {
    refunds: Vec<Refund>,
}

impl LoggingRefundSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refunds(&self) -> &[Refund] {
        &self.refunds
    }

    pub fn total_refunded(&self) -> Money {
        self.refunds.iter().map(|r| r.amount).sum()
    }
}

impl RefundSink for LoggingRefundSink {
    fn send_back(&mut self, refund: Refund) -> Result<()> {
        tracing::info!(
            loan_id = %refund.loan_id,
            amount = %refund.amount,
            "refund sent back to client account"
        );
        self.refunds.push(refund);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client(born: NaiveDate) -> Client {
        Client::new("Giorgi", "Lomidze", born)
    }

    #[test]
    fn test_minimum_age_policy() {
        let policy = MinimumAge::default();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert!(policy.is_eligible(&client(NaiveDate::from_ymd_opt(1990, 5, 5).unwrap()), today));
        assert!(!policy.is_eligible(&client(NaiveDate::from_ymd_opt(2010, 5, 5).unwrap()), today));
    }

    #[test]
    fn test_fixed_credit_score() {
        let borrower = client(NaiveDate::from_ymd_opt(1990, 5, 5).unwrap());
        assert_eq!(FixedCreditScore::default().score(&borrower), Decimal::from(600));
    }

    #[test]
    fn test_logging_sink_records_refunds() {
        let mut sink = LoggingRefundSink::new();
        let loan_id = Uuid::new_v4();

        sink.send_back(Refund { loan_id, amount: Money::from_major(20), issued_at: Utc::now() }).unwrap();
        sink.send_back(Refund { loan_id, amount: Money::from_major(5), issued_at: Utc::now() }).unwrap();

        assert_eq!(sink.refunds().len(), 2);
        assert_eq!(sink.total_refunded(), Money::from_major(25));
    }
}
