use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::payments::monthly_payment;
use crate::penalty::LATE_PAYMENT_REASON;

/// longest term a loan can be written for (50 years)
pub const MAX_DURATION_MONTHS: u32 = 600;

/// highest nominal annual rate accepted, as a fraction (100%)
pub const MAX_ANNUAL_RATE: Decimal = Decimal::ONE;

/// largest principal accepted, in major units
pub const MAX_PRINCIPAL: i64 = 1_000_000_000_000_000;

/// per-loan servicing rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanConfig {
    /// balances below this are treated as fully repaid
    pub settlement_tolerance: Money,
    pub penalty: PenaltyConfig,
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self {
            settlement_tolerance: Money::CENT,
            penalty: PenaltyConfig::default(),
        }
    }
}

/// late penalty policy
///
/// a flat fraction of the original principal per missed period; it does not
/// compound and does not grow with the number of months overdue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    pub rate: Rate,
    pub reason: String,
}

impl PenaltyConfig {
    pub fn flat(rate: Rate) -> Self {
        Self {
            rate,
            reason: LATE_PAYMENT_REASON.to_string(),
        }
    }

    /// penalty owed for one missed period on a loan of `principal`
    pub fn amount_for(&self, principal: Money) -> Money {
        principal.apply(self.rate)
    }
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self::flat(Rate::from_percentage(1))
    }
}

/// configuration of the servicing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicingConfig {
    /// youngest age at which a client may borrow
    pub minimum_borrower_age: u32,
    /// score assigned by the default credit scoring strategy
    pub default_credit_score: Decimal,
    /// rules stamped onto every new loan
    pub loan: LoanConfig,
}

impl Default for ServicingConfig {
    fn default() -> Self {
        Self {
            minimum_borrower_age: 18,
            default_credit_score: Decimal::from(600),
            loan: LoanConfig::default(),
        }
    }
}

impl ServicingConfig {
    /// parse from a json document; missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<PartialServicingConfig>(json)
            .map(PartialServicingConfig::resolve)
            .map_err(|e| LoanError::InvalidTerms {
                message: format!("invalid servicing config: {}", e),
            })
    }
}

#[derive(Deserialize)]
struct PartialServicingConfig {
    minimum_borrower_age: Option<u32>,
    default_credit_score: Option<Decimal>,
    loan: Option<LoanConfig>,
}

impl PartialServicingConfig {
    fn resolve(self) -> ServicingConfig {
        let defaults = ServicingConfig::default();
        ServicingConfig {
            minimum_borrower_age: self.minimum_borrower_age.unwrap_or(defaults.minimum_borrower_age),
            default_credit_score: self.default_credit_score.unwrap_or(defaults.default_credit_score),
            loan: self.loan.unwrap_or(defaults.loan),
        }
    }
}

/// terms requested in a loan application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub name: String,
    pub amount: Money,
    /// nominal annual rate
    pub interest_rate: Rate,
    pub duration_in_months: u32,
    pub start_date: NaiveDate,
}

impl LoanTerms {
    pub fn new(
        name: impl Into<String>,
        amount: Money,
        interest_rate: Rate,
        duration_in_months: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            interest_rate,
            duration_in_months,
            start_date,
        }
    }

    /// reject terms that cannot be amortized
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(LoanError::InvalidTerms {
                message: format!("amount must be positive, got {}", self.amount),
            });
        }

        if self.duration_in_months == 0 {
            return Err(LoanError::InvalidTerms {
                message: "duration must be at least one month".to_string(),
            });
        }

        if self.amount > Money::from_major(MAX_PRINCIPAL) {
            return Err(LoanError::InvalidTerms {
                message: format!("amount cannot exceed {MAX_PRINCIPAL}, got {}", self.amount),
            });
        }

        if self.duration_in_months > MAX_DURATION_MONTHS {
            return Err(LoanError::InvalidTerms {
                message: format!(
                    "duration cannot exceed {MAX_DURATION_MONTHS} months, got {}",
                    self.duration_in_months
                ),
            });
        }

        if self.interest_rate.as_decimal() < Decimal::ZERO {
            return Err(LoanError::InvalidTerms {
                message: format!("interest rate cannot be negative, got {}", self.interest_rate),
            });
        }

        if self.interest_rate.as_decimal() > MAX_ANNUAL_RATE {
            return Err(LoanError::InvalidTerms {
                message: format!("interest rate cannot exceed 100%, got {}", self.interest_rate),
            });
        }

        monthly_payment(self.amount, self.interest_rate, self.duration_in_months)?;

        Ok(())
    }
}
