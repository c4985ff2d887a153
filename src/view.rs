//! serializable projections of a loan
use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::loan::Loan;
use crate::penalty::Penalty;
use crate::types::{LoanId, LoanStatus};

/// what a borrower sees when asking for the state of their loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanStatusView {
    pub loan_id: LoanId,
    /// next installment nothing has been paid toward
    pub monthly_payment: Money,
    /// still owed on the installment billed this period
    pub current_month_payment: Money,
    pub remaining_amount: Money,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

impl LoanStatusView {
    pub fn from_loan(loan: &Loan, time_provider: &SafeTimeProvider) -> Self {
        Self {
            loan_id: loan.id,
            monthly_payment: loan.get_next_month_payment(),
            current_month_payment: loan.get_this_month_payment(time_provider),
            remaining_amount: loan.remaining_amount,
            name: loan.name.clone(),
            start_date: loan.start_date,
            end_date: loan.end_date,
            status: loan.status.display_string().to_string(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// full account summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub name: String,
    pub status: LoanStatus,
    pub amount: Money,
    pub remaining_amount: Money,
    pub interest_rate: Rate,
    pub duration_in_months: u32,
    pub paid_installments: u32,
    pub unpaid_installments: u32,
    pub open_penalties: Vec<PenaltyView>,
    pub payments_made: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyView {
    pub id: uuid::Uuid,
    pub amount: Money,
    pub remaining_amount: Money,
    pub reason: String,
}

impl From<&Penalty> for PenaltyView {
    fn from(penalty: &Penalty) -> Self {
        Self {
            id: penalty.id,
            amount: penalty.amount,
            remaining_amount: penalty.remaining_amount,
            reason: penalty.reason.clone(),
        }
    }
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        let unpaid = loan.unpaid_installments();
        Self {
            id: loan.id,
            name: loan.name.clone(),
            status: loan.status,
            amount: loan.amount,
            remaining_amount: loan.remaining_amount,
            interest_rate: loan.interest_rate,
            duration_in_months: loan.duration_in_months,
            paid_installments: loan.payment_schedules.len() as u32 - unpaid,
            unpaid_installments: unpaid,
            open_penalties: loan
                .penalties
                .iter()
                .filter(|p| !p.is_paid)
                .map(PenaltyView::from)
                .collect(),
            payments_made: loan.payments.len(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn loan() -> Loan {
        let mut loan = Loan::builder()
            .name("Car")
            .amount(Money::from_major(10_000))
            .rate(Rate::from_percentage(12))
            .duration_in_months(12)
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .build()
            .unwrap();
        loan.status = LoanStatus::Approved;
        loan.generate_payment_schedules().unwrap();
        loan
    }

    #[test]
    fn test_status_view_fields() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap()));
        let mut loan = loan();
        loan.make_payment(Money::from_major(300), &time).unwrap();

        let view = LoanStatusView::from_loan(&loan, &time);

        assert_eq!(view.name, "Car");
        assert_eq!(view.status, "Loan has been Approved");
        assert_eq!(view.remaining_amount, Money::from_major(9_700));
        assert_eq!(view.current_month_payment, Money::from_decimal(dec!(588.49)));
        assert_eq!(view.monthly_payment, Money::from_decimal(dec!(888.49)));
        assert_eq!(view.end_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_status_view_json() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap()));
        let view = LoanStatusView::from_loan(&loan(), &time);

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"remaining_amount\": \"10000\""));
        assert!(json.contains("\"status\": \"Loan has been Approved\""));

        let parsed: LoanStatusView = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, view);
    }

    #[test]
    fn test_loan_view_counts() {
        let mut loan = loan();
        loan.payment_schedules[0].settle();

        let view = LoanView::from_loan(&loan);
        assert_eq!(view.paid_installments, 1);
        assert_eq!(view.unpaid_installments, 11);
        assert!(view.open_penalties.is_empty());
        assert!(view.to_json_pretty().is_ok());
    }
}
