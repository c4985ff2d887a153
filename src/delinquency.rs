use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::Serialize;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::LoanError;
use crate::loan::Loan;
use crate::penalty::Penalty;
use crate::servicing::ports::PenaltyRepository;
use crate::types::{LoanId, LoanStatus};

/// penalty created by a scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImposedPenalty {
    pub loan_id: LoanId,
    pub penalty_id: Uuid,
    pub amount: Money,
}

/// loan the scan could not penalize
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    pub loan_id: LoanId,
    pub error: LoanError,
}

/// outcome of one delinquency scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub checked: usize,
    /// loans not in a payable approved state
    pub skipped: usize,
    pub penalties: Vec<ImposedPenalty>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    fn new(scanned_at: DateTime<Utc>) -> Self {
        Self {
            scanned_at,
            checked: 0,
            skipped: 0,
            penalties: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn total_imposed(&self) -> Money {
        self.penalties.iter().map(|p| p.amount).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// finds loans behind on their installments and imposes a late penalty on each
///
/// one penalty per loan per run; triggering the scan periodically is left to
/// the caller.
#[derive(Debug, Clone, Default)]
pub struct DelinquencyScanner;

impl DelinquencyScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan<P>(&self, loans: &[Loan], penalties: &mut P, time_provider: &SafeTimeProvider) -> ScanReport
    where
        P: PenaltyRepository + ?Sized,
    {
        let now = time_provider.now();
        let mut report = ScanReport::new(now);

        tracing::info!(loans = loans.len(), "starting delinquency scan");

        for loan in loans {
            if loan.status != LoanStatus::Approved {
                report.skipped += 1;
                continue;
            }

            report.checked += 1;

            if loan.have_last_months_fully_paid(time_provider) {
                continue;
            }

            let penalty = Penalty::new(
                loan.id,
                loan.calculate_penalty(),
                loan.config.penalty.reason.clone(),
                now,
            );
            let imposed = ImposedPenalty {
                loan_id: loan.id,
                penalty_id: penalty.id,
                amount: penalty.amount,
            };

            match penalties.add_penalty(penalty) {
                Ok(()) => {
                    tracing::info!(
                        loan_id = %loan.id,
                        amount = %imposed.amount,
                        "late payment penalty imposed"
                    );
                    report.penalties.push(imposed);
                }
                Err(error) => {
                    tracing::error!(loan_id = %loan.id, %error, "failed to impose penalty");
                    report.failures.push(ScanFailure {
                        loan_id: loan.id,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            checked = report.checked,
            skipped = report.skipped,
            imposed = report.penalties.len(),
            failed = report.failures.len(),
            "delinquency scan completed"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::errors::Result;
    use crate::servicing::memory::InMemoryLedger;
    use crate::servicing::ports::LoanRepository;
    use chrono::{NaiveDate, TimeZone};
    use hourglass_rs::TimeSource;

    fn approved_loan(start: NaiveDate) -> Loan {
        let mut loan = Loan::builder()
            .amount(Money::from_major(10_000))
            .rate(Rate::from_percentage(12))
            .duration_in_months(12)
            .start_date(start)
            .build()
            .unwrap();
        loan.status = LoanStatus::Approved;
        loan.generate_payment_schedules().unwrap();
        loan
    }

    fn time_at(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()))
    }

    /// rejects every write
    struct BrokenPenalties;

    impl PenaltyRepository for BrokenPenalties {
        fn add_penalty(&mut self, _penalty: Penalty) -> Result<()> {
            Err(LoanError::Persistence { message: "disk full".to_string() })
        }

        fn get_penalty(&self, id: Uuid) -> Result<Penalty> {
            Err(LoanError::PenaltyNotFound { id })
        }

        fn update_penalty(&mut self, _penalty: &Penalty) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missed_installment_gets_penalty() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut ledger = InMemoryLedger::new();

        let behind = approved_loan(start);
        let mut current = approved_loan(start);
        current.payment_schedules[0].settle();

        let behind_id = behind.id;
        ledger.add_loan(behind).unwrap();
        ledger.add_loan(current).unwrap();

        // first installment fell due on feb 10
        let time = time_at(2024, 2, 12);
        let loans = ledger.all_loans().unwrap();
        let report = DelinquencyScanner::new().scan(&loans, &mut ledger, &time);

        assert_eq!(report.checked, 2);
        assert_eq!(report.penalties.len(), 1);
        assert_eq!(report.penalties[0].loan_id, behind_id);
        assert_eq!(report.total_imposed(), Money::from_major(100));

        let stored = ledger.get_loan(behind_id).unwrap();
        let penalty = &stored.penalties[0];
        assert_eq!(penalty.amount, Money::from_major(100));
        assert_eq!(penalty.reason, "Late payment penalty");
        assert!(!penalty.is_paid);
        assert_eq!(penalty.imposed_date, time.now());
    }

    #[test]
    fn test_nothing_due_yet() {
        let mut ledger = InMemoryLedger::new();
        ledger.add_loan(approved_loan(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())).unwrap();

        let loans = ledger.all_loans().unwrap();
        let report = DelinquencyScanner::new().scan(&loans, &mut ledger, &time_at(2024, 2, 9));

        assert!(report.penalties.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_non_approved_loans_skipped() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut ledger = InMemoryLedger::new();

        let mut completed = approved_loan(start);
        completed.status = LoanStatus::Completed;
        let mut pending = approved_loan(start);
        pending.status = LoanStatus::Pending;
        ledger.add_loan(completed).unwrap();
        ledger.add_loan(pending).unwrap();

        let loans = ledger.all_loans().unwrap();
        let report = DelinquencyScanner::new().scan(&loans, &mut ledger, &time_at(2024, 6, 1));

        assert_eq!(report.skipped, 2);
        assert_eq!(report.checked, 0);
        assert!(report.penalties.is_empty());
    }

    #[test]
    fn test_failure_does_not_abort_scan() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let loans = vec![approved_loan(start), approved_loan(start)];

        let report = DelinquencyScanner::new().scan(&loans, &mut BrokenPenalties, &time_at(2024, 3, 1));

        assert_eq!(report.checked, 2);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_clean());
        assert!(report.penalties.is_empty());
    }

    #[test]
    fn test_repeat_scan_adds_another_penalty() {
        let mut ledger = InMemoryLedger::new();
        let loan = approved_loan(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        let id = loan.id;
        ledger.add_loan(loan).unwrap();

        let time = time_at(2024, 2, 12);
        for _ in 0..2 {
            let loans = ledger.all_loans().unwrap();
            DelinquencyScanner::new().scan(&loans, &mut ledger, &time);
        }

        assert_eq!(ledger.get_loan(id).unwrap().penalties.len(), 2);
    }
}
