use std::collections::HashMap;

use uuid::Uuid;

use crate::client::Client;
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::payments::Payment;
use crate::penalty::Penalty;
use crate::types::{ClientId, LoanId};

use super::ports::{ClientRepository, LoanRepository, PaymentRepository, PenaltyRepository};

/// in-memory store backing every repository
///
/// penalties live inside their loan; adding or updating one writes the loan
/// and bumps its version.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    loans: HashMap<LoanId, Loan>,
    payments: Vec<Payment>,
    clients: HashMap<ClientId, Client>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.len()
    }

    fn owner_of_penalty(&self, penalty_id: Uuid) -> Option<LoanId> {
        self.loans
            .values()
            .find(|loan| loan.penalties.iter().any(|p| p.id == penalty_id))
            .map(|loan| loan.id)
    }
}

impl LoanRepository for InMemoryLedger {
    fn add_loan(&mut self, loan: Loan) -> Result<()> {
        if self.loans.contains_key(&loan.id) {
            return Err(LoanError::Persistence {
                message: format!("loan {} already exists", loan.id),
            });
        }
        self.loans.insert(loan.id, loan);
        Ok(())
    }

    fn get_loan(&self, id: LoanId) -> Result<Loan> {
        self.loans.get(&id).cloned().ok_or(LoanError::LoanNotFound { id })
    }

    fn update_loan(&mut self, loan: &Loan) -> Result<u64> {
        let stored = self
            .loans
            .get_mut(&loan.id)
            .ok_or(LoanError::LoanNotFound { id: loan.id })?;

        if stored.version != loan.version {
            return Err(LoanError::ConcurrencyConflict {
                id: loan.id,
                expected: loan.version,
                found: stored.version,
            });
        }

        let mut next = loan.clone();
        next.version += 1;
        next.events.clear();
        *stored = next;

        Ok(stored.version)
    }

    fn all_loans(&self) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self.loans.values().cloned().collect();
        loans.sort_by_key(|loan| (loan.start_date, loan.id));
        Ok(loans)
    }
}

impl PaymentRepository for InMemoryLedger {
    fn append_payment(&mut self, payment: Payment) -> Result<()> {
        if !self.loans.contains_key(&payment.loan_id) {
            return Err(LoanError::LoanNotFound { id: payment.loan_id });
        }
        self.payments.push(payment);
        Ok(())
    }

    fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        Ok(self
            .payments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect())
    }

    fn retract_payment(&mut self, payment_id: Uuid) -> Result<()> {
        let before = self.payments.len();
        self.payments.retain(|p| p.id != payment_id);

        if self.payments.len() == before {
            return Err(LoanError::Persistence {
                message: format!("payment {} not in the log", payment_id),
            });
        }
        Ok(())
    }
}

impl PenaltyRepository for InMemoryLedger {
    fn add_penalty(&mut self, penalty: Penalty) -> Result<()> {
        let loan = self
            .loans
            .get_mut(&penalty.loan_id)
            .ok_or(LoanError::LoanNotFound { id: penalty.loan_id })?;

        loan.impose_penalty(penalty)?;
        loan.events.clear();
        loan.version += 1;
        Ok(())
    }

    fn get_penalty(&self, id: Uuid) -> Result<Penalty> {
        self.loans
            .values()
            .flat_map(|loan| loan.penalties.iter())
            .find(|p| p.id == id)
            .cloned()
            .ok_or(LoanError::PenaltyNotFound { id })
    }

    fn update_penalty(&mut self, penalty: &Penalty) -> Result<()> {
        let owner = self
            .owner_of_penalty(penalty.id)
            .ok_or(LoanError::PenaltyNotFound { id: penalty.id })?;

        let loan = self
            .loans
            .get_mut(&owner)
            .ok_or(LoanError::LoanNotFound { id: owner })?;

        if let Some(stored) = loan.penalties.iter_mut().find(|p| p.id == penalty.id) {
            *stored = penalty.clone();
        }
        loan.version += 1;
        Ok(())
    }
}

impl ClientRepository for InMemoryLedger {
    fn add_client(&mut self, client: Client) -> Result<()> {
        self.clients.insert(client.id, client);
        Ok(())
    }

    fn get_client(&self, id: ClientId) -> Result<Client> {
        self.clients.get(&id).cloned().ok_or(LoanError::ClientNotFound { id })
    }
}
