use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ClientId;

/// a borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    /// assigned at registration by the credit scoring strategy
    pub credit_score: Decimal,
}

impl Client {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            credit_score: Decimal::ZERO,
        }
    }

    /// completed years of age on `today`
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let mut age = today.year() - self.date_of_birth.year();

        // birthday not reached yet this year
        if (today.month(), today.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }

        age.max(0) as u32
    }

    pub fn is_eligible_for_loan(&self, today: NaiveDate, minimum_age: u32) -> bool {
        self.age_on(today) >= minimum_age
    }
}
