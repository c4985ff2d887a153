use hourglass_rs::SafeTimeProvider;
use serde::Serialize;
use uuid::Uuid;

use crate::client::Client;
use crate::config::{LoanTerms, ServicingConfig};
use crate::decimal::Money;
use crate::delinquency::{DelinquencyScanner, ScanReport};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::Loan;
use crate::payments::Payment;
use crate::types::{ClientId, LoanId, LoanStatus, PaymentApplication};
use crate::view::LoanStatusView;

use super::ports::{
    ApproveAll, ClientEligibility, CreditScoreStrategy, FixedCreditScore, LedgerStore,
    LoanApprovalPolicy, LoggingRefundSink, MinimumAge, Refund, RefundSink,
};

/// outcome of a loan payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub payment_id: Uuid,
    pub loan_id: LoanId,
    /// amount applied to the loan after capping at the balance
    pub applied: Money,
    pub refunded: Money,
    /// the excess could not be sent back; the payment itself is committed
    pub refund_failed: bool,
    pub application: PaymentApplication,
    pub remaining_amount: Money,
    pub status: LoanStatus,
}

/// outcome of a direct penalty payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyReceipt {
    pub penalty_id: Uuid,
    pub applied: Money,
    pub refunded: Money,
    pub refund_failed: bool,
    pub remaining_amount: Money,
    pub is_paid: bool,
}

/// orchestrates loan workflows over a ledger store
///
/// each workflow loads the loan, mutates it and writes it back as one unit.
/// a failed write leaves the store as it was before the call.
pub struct LoanService<S, F = LoggingRefundSink> {
    store: S,
    refunds: F,
    approval: Box<dyn LoanApprovalPolicy>,
    eligibility: Box<dyn ClientEligibility>,
    credit_score: Box<dyn CreditScoreStrategy>,
    scanner: DelinquencyScanner,
    config: ServicingConfig,
    journal: EventStore,
}

impl<S: LedgerStore> LoanService<S, LoggingRefundSink> {
    pub fn new(store: S, config: ServicingConfig) -> Self {
        let eligibility = MinimumAge {
            years: config.minimum_borrower_age,
        };
        let credit_score = FixedCreditScore(config.default_credit_score);

        Self {
            store,
            refunds: LoggingRefundSink::new(),
            approval: Box::new(ApproveAll),
            eligibility: Box::new(eligibility),
            credit_score: Box::new(credit_score),
            scanner: DelinquencyScanner::new(),
            config,
            journal: EventStore::new(),
        }
    }
}

impl<S: LedgerStore, F: RefundSink> LoanService<S, F> {
    pub fn with_refund_sink<G: RefundSink>(self, refunds: G) -> LoanService<S, G> {
        LoanService {
            store: self.store,
            refunds,
            approval: self.approval,
            eligibility: self.eligibility,
            credit_score: self.credit_score,
            scanner: self.scanner,
            config: self.config,
            journal: self.journal,
        }
    }

    pub fn with_approval_policy(mut self, policy: impl LoanApprovalPolicy + 'static) -> Self {
        self.approval = Box::new(policy);
        self
    }

    pub fn with_eligibility(mut self, eligibility: impl ClientEligibility + 'static) -> Self {
        self.eligibility = Box::new(eligibility);
        self
    }

    pub fn with_credit_score(mut self, strategy: impl CreditScoreStrategy + 'static) -> Self {
        self.credit_score = Box::new(strategy);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn refund_sink(&self) -> &F {
        &self.refunds
    }

    pub fn config(&self) -> &ServicingConfig {
        &self.config
    }

    /// drain the events recorded by completed workflows
    pub fn take_events(&mut self) -> Vec<Event> {
        self.journal.take_events()
    }

    /// score and store a new client
    pub fn register_client(&mut self, mut client: Client) -> Result<ClientId> {
        client.credit_score = self.credit_score.score(&client);
        let id = client.id;

        self.store.add_client(client)?;
        tracing::info!(client_id = %id, "client registered");

        Ok(id)
    }

    /// check eligibility, decide, and store a new loan
    ///
    /// approved loans get their installment plan immediately.
    pub fn apply_for_loan(
        &mut self,
        client_id: ClientId,
        terms: LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        let client = self.store.get_client(client_id)?;
        terms.validate()?;

        let today = time_provider.now().date_naive();
        if !self.eligibility.is_eligible(&client, today) {
            tracing::warn!(client_id = %client.id, "client is not eligible for a loan");
            return Err(LoanError::ClientNotEligible { client_id: client.id });
        }

        tracing::info!(client_id = %client.id, amount = %terms.amount, "applying for loan");

        let mut loan = Loan::new(client.id, terms, self.config.loan.clone());
        let approved = self.approval.is_approved(&client, &loan);
        loan.decide(approved, time_provider)?;

        if loan.status == LoanStatus::Approved {
            loan.generate_payment_schedules()?;
        }

        let events = loan.take_events();
        self.store.add_loan(loan.clone())?;
        self.record(events);

        tracing::info!(
            client_id = %client.id,
            loan_id = %loan.id,
            status = ?loan.status,
            "loan application processed"
        );

        Ok(loan)
    }

    /// apply a payment to a loan
    ///
    /// money beyond the remaining balance is refunded once the payment is
    /// stored. a refund that fails after that point is logged and flagged on
    /// the receipt rather than failing the call.
    pub fn make_payment(
        &mut self,
        loan_id: LoanId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        if !amount.is_positive() {
            tracing::warn!(%loan_id, %amount, "invalid payment amount");
            return Err(LoanError::InvalidPaymentAmount { amount });
        }

        let mut loan = self.store.get_loan(loan_id).inspect_err(|error| {
            tracing::error!(%loan_id, %error, "loan lookup failed");
        })?;

        if !loan.status.can_accept_payment() {
            tracing::warn!(%loan_id, status = ?loan.status, "payment attempted on closed loan");
            return Err(LoanError::LoanNotPayable { status: loan.status });
        }

        let mut applied = amount;
        let mut refunded = Money::ZERO;
        if amount > loan.remaining_amount {
            refunded = amount - loan.remaining_amount;
            applied = loan.remaining_amount;
            tracing::info!(%loan_id, %refunded, "payment exceeds remaining balance");
        }

        let now = time_provider.now();

        tracing::info!(%loan_id, amount = %applied, "processing payment");

        let application = loan.make_payment(applied, time_provider).inspect_err(|error| {
            tracing::warn!(%loan_id, %error, "payment rejected");
        })?;

        let payment = Payment::new(loan.id, applied, now);
        let payment_id = payment.id;
        loan.record_payment(payment.clone());
        let events = loan.take_events();

        if let Err(error) = self.commit_payment(&mut loan, payment) {
            tracing::error!(%loan_id, %error, "payment rolled back");
            return Err(error);
        }

        self.record(events);
        let refund_failed = self.refund_excess(loan.id, refunded, time_provider);

        tracing::info!(
            %loan_id,
            amount = %applied,
            remaining = %loan.remaining_amount,
            "payment processed"
        );

        Ok(PaymentReceipt {
            payment_id,
            loan_id: loan.id,
            applied,
            refunded,
            refund_failed,
            application,
            remaining_amount: loan.remaining_amount,
            status: loan.status,
        })
    }

    /// append the payment and write the loan, retracting the payment if the
    /// loan write fails
    fn commit_payment(&mut self, loan: &mut Loan, payment: Payment) -> Result<()> {
        let payment_id = payment.id;
        self.store.append_payment(payment)?;

        match self.store.update_loan(loan) {
            Ok(version) => {
                loan.version = version;
                Ok(())
            }
            Err(error) => {
                if let Err(retract_error) = self.store.retract_payment(payment_id) {
                    tracing::error!(%payment_id, error = %retract_error, "failed to retract payment");
                }
                Err(error)
            }
        }
    }

    /// pay a penalty directly, refunding anything beyond what it owes
    pub fn make_penalty_payment(
        &mut self,
        penalty_id: Uuid,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PenaltyReceipt> {
        if !amount.is_positive() {
            return Err(LoanError::InvalidPaymentAmount { amount });
        }

        let mut penalty = self.store.get_penalty(penalty_id).inspect_err(|_| {
            tracing::error!(%penalty_id, "penalty not found");
        })?;

        if penalty.is_paid {
            tracing::warn!(%penalty_id, "penalty is already paid");
            return Err(LoanError::PenaltyAlreadyPaid { id: penalty_id });
        }

        let now = time_provider.now();
        let applied = penalty.apply(amount, now);
        let refunded = amount - applied;

        self.store.update_penalty(&penalty)?;

        self.journal.emit(Event::PenaltyPaid {
            loan_id: penalty.loan_id,
            penalty_id,
            amount: applied,
            fully_paid: penalty.is_paid,
            timestamp: now,
        });

        let refund_failed = self.refund_excess(penalty.loan_id, refunded, time_provider);

        tracing::info!(
            %penalty_id,
            amount = %applied,
            remaining = %penalty.remaining_amount,
            "penalty payment processed"
        );

        Ok(PenaltyReceipt {
            penalty_id,
            applied,
            refunded,
            refund_failed,
            remaining_amount: penalty.remaining_amount,
            is_paid: penalty.is_paid,
        })
    }

    /// status of a loan owned by `client_id`
    pub fn loan_status(
        &self,
        client_id: ClientId,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanStatusView> {
        let loan = self.store.get_loan(loan_id)?;

        if loan.client_id != client_id {
            tracing::warn!(%client_id, %loan_id, "client does not own loan");
            return Err(LoanError::LoanNotOwned { loan_id, client_id });
        }

        Ok(LoanStatusView::from_loan(&loan, time_provider))
    }

    /// every payment made against the client's loans
    pub fn payments_for_client(&self, client_id: ClientId) -> Result<Vec<Payment>> {
        let mut payments = Vec::new();
        for loan in self.store.loans_for_client(client_id)? {
            payments.extend(self.store.payments_for_loan(loan.id)?);
        }
        payments.sort_by_key(|p| p.payment_date);

        tracing::info!(%client_id, count = payments.len(), "payments fetched");
        Ok(payments)
    }

    /// penalize every approved loan that is behind
    pub fn run_delinquency_scan(&mut self, time_provider: &SafeTimeProvider) -> Result<ScanReport> {
        let loans = self.store.all_loans()?;
        let report = self.scanner.scan(&loans, &mut self.store, time_provider);

        for imposed in &report.penalties {
            self.journal.emit(Event::PenaltyImposed {
                loan_id: imposed.loan_id,
                penalty_id: imposed.penalty_id,
                amount: imposed.amount,
                timestamp: report.scanned_at,
            });
        }

        Ok(report)
    }

    /// send back money that was not applied, reporting whether that failed
    ///
    /// runs after the payment is committed, so a failure cannot undo it.
    fn refund_excess(&mut self, loan_id: LoanId, amount: Money, time_provider: &SafeTimeProvider) -> bool {
        if !amount.is_positive() {
            return false;
        }

        match self.refund(loan_id, amount, time_provider) {
            Ok(()) => false,
            Err(error) => {
                tracing::error!(%loan_id, %amount, %error, "refund failed after payment was committed");
                true
            }
        }
    }

    fn refund(&mut self, loan_id: LoanId, amount: Money, time_provider: &SafeTimeProvider) -> Result<()> {
        let issued_at = time_provider.now();
        self.refunds.send_back(Refund {
            loan_id,
            amount,
            issued_at,
        })?;

        self.journal.emit(Event::RefundIssued {
            loan_id,
            amount,
            timestamp: issued_at,
        });
        Ok(())
    }

    fn record(&mut self, events: Vec<Event>) {
        for event in events {
            self.journal.emit(event);
        }
    }
}
