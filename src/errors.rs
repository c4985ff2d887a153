use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("payment exceeds remaining balance: remaining {remaining}, requested {requested}")]
    PaymentExceedsBalance {
        remaining: Money,
        requested: Money,
    },

    #[error("invalid loan terms: {message}")]
    InvalidTerms {
        message: String,
    },

    #[error("loan does not accept payments: current status is {status:?}")]
    LoanNotPayable {
        status: LoanStatus,
    },

    #[error("penalty already paid: {id}")]
    PenaltyAlreadyPaid {
        id: Uuid,
    },

    #[error("client not eligible for a loan: {client_id}")]
    ClientNotEligible {
        client_id: Uuid,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: Uuid,
    },

    #[error("penalty not found: {id}")]
    PenaltyNotFound {
        id: Uuid,
    },

    #[error("client not found: {id}")]
    ClientNotFound {
        id: Uuid,
    },

    #[error("loan {loan_id} does not belong to client {client_id}")]
    LoanNotOwned {
        loan_id: Uuid,
        client_id: Uuid,
    },

    #[error("concurrent modification of loan {id}: expected version {expected}, found {found}")]
    ConcurrencyConflict {
        id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("persistence error: {message}")]
    Persistence {
        message: String,
    },
}

/// coarse classification of a [`LoanError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidState,
    NotFound,
    Conflict,
    Persistence,
}

impl LoanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::InvalidPaymentAmount { .. }
            | LoanError::PaymentExceedsBalance { .. }
            | LoanError::PenaltyAlreadyPaid { .. }
            | LoanError::LoanNotOwned { .. } => ErrorKind::InvalidArgument,
            LoanError::InvalidTerms { .. }
            | LoanError::LoanNotPayable { .. }
            | LoanError::ClientNotEligible { .. }
            | LoanError::InvalidState { .. } => ErrorKind::InvalidState,
            LoanError::LoanNotFound { .. }
            | LoanError::PenaltyNotFound { .. }
            | LoanError::ClientNotFound { .. } => ErrorKind::NotFound,
            LoanError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            LoanError::Persistence { .. } => ErrorKind::Persistence,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
