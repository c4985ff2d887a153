use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{LoanConfig, LoanTerms, MAX_DURATION_MONTHS};
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::payments::amortization::{add_months, last_due_date};
use crate::payments::{allocate_to_penalties, current_installment, monthly_payment, Payment};
use crate::penalty::Penalty;
use crate::schedule::PaymentSchedule;
use crate::state::LoanSnapshot;
use crate::types::{ClientId, LoanId, LoanStatus, PaymentApplication};

/// loan aggregate: owns its installments, penalties and payment log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub client_id: ClientId,
    pub name: String,

    // balances
    pub amount: Money,
    pub remaining_amount: Money,

    // terms
    pub interest_rate: Rate,
    pub duration_in_months: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    pub status: LoanStatus,

    pub payment_schedules: Vec<PaymentSchedule>,
    pub penalties: Vec<Penalty>,
    pub payments: Vec<Payment>,

    pub config: LoanConfig,

    /// bumped by the repository on every successful save
    pub version: u64,

    #[serde(skip)]
    pub events: EventStore,
}

impl Loan {
    /// create a pending loan from application terms
    pub fn new(client_id: ClientId, terms: LoanTerms, config: LoanConfig) -> Self {
        let end_date = add_months(terms.start_date, terms.duration_in_months)
            .unwrap_or(terms.start_date);

        Self {
            id: Uuid::new_v4(),
            client_id,
            name: terms.name,
            amount: terms.amount,
            remaining_amount: terms.amount,
            interest_rate: terms.interest_rate,
            duration_in_months: terms.duration_in_months,
            start_date: terms.start_date,
            end_date,
            status: LoanStatus::Pending,
            payment_schedules: Vec::new(),
            penalties: Vec::new(),
            payments: Vec::new(),
            config,
            version: 0,
            events: EventStore::new(),
        }
    }

    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    /// day of month every installment falls due on
    pub fn billing_day(&self) -> u32 {
        self.start_date.day()
    }

    /// build the fixed installment plan from the original terms
    ///
    /// replaces any existing plan.
    pub fn generate_payment_schedules(&mut self) -> Result<&[PaymentSchedule]> {
        if !self.amount.is_positive() {
            return Err(LoanError::InvalidTerms {
                message: format!("cannot amortize non-positive amount {}", self.amount),
            });
        }

        if self.duration_in_months == 0 || self.duration_in_months > MAX_DURATION_MONTHS {
            return Err(LoanError::InvalidTerms {
                message: format!(
                    "duration must be between 1 and {MAX_DURATION_MONTHS} months, got {}",
                    self.duration_in_months
                ),
            });
        }

        let payment = monthly_payment(self.amount, self.interest_rate, self.duration_in_months)?;

        let mut schedules = Vec::with_capacity(self.duration_in_months as usize);
        for month in 1..=self.duration_in_months {
            let due = add_months(self.start_date, month).ok_or_else(|| LoanError::InvalidTerms {
                message: format!("installment {} falls outside the calendar", month),
            })?;
            schedules.push(PaymentSchedule::new(self.id, due, payment));
        }

        let first_due = schedules[0].payment_day;
        self.payment_schedules = schedules;

        self.events.emit(Event::SchedulesGenerated {
            loan_id: self.id,
            installments: self.duration_in_months,
            monthly_payment: payment,
            first_due,
        });

        Ok(&self.payment_schedules)
    }

    /// number of installments not yet paid
    pub fn unpaid_installments(&self) -> u32 {
        self.payment_schedules.iter().filter(|s| !s.is_paid).count() as u32
    }

    /// payment that amortizes the remaining balance over the unpaid installments
    pub fn calculate_monthly_payment(&self) -> Result<Money> {
        monthly_payment(self.remaining_amount, self.interest_rate, self.unpaid_installments())
    }

    /// flat late fee for one missed period
    pub fn calculate_penalty(&self) -> Money {
        self.config.penalty.amount_for(self.amount)
    }

    /// apply an incoming payment with system time
    pub fn make_payment_now(&mut self, amount: Money) -> Result<PaymentApplication> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.make_payment(amount, &time)
    }

    /// apply an incoming payment
    ///
    /// penalties are paid first, oldest first. whatever is paid reduces the
    /// remaining balance; the rest goes to the installment billed this period
    /// and any surplus is spread over the unpaid installments by lowering
    /// their amount. all checks run before the first mutation; if the re-spread
    /// cannot be computed the loan is put back as it was.
    pub fn make_payment(
        &mut self,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentApplication> {
        if !amount.is_positive() {
            return Err(LoanError::InvalidPaymentAmount { amount });
        }

        if !self.status.can_accept_payment() {
            return Err(LoanError::LoanNotPayable { status: self.status });
        }

        if amount > self.remaining_amount {
            return Err(LoanError::PaymentExceedsBalance {
                remaining: self.remaining_amount,
                requested: amount,
            });
        }

        let now = time_provider.now();
        let snapshot = LoanSnapshot::capture(self, "payment", now);
        let mut application = PaymentApplication::default();

        // penalties first
        let (allocations, mut available) = allocate_to_penalties(&mut self.penalties, amount, now);
        for allocation in allocations {
            application.to_penalties += allocation.applied;
            self.events.emit(Event::PenaltyPaid {
                loan_id: self.id,
                penalty_id: allocation.penalty_id,
                amount: allocation.applied,
                fully_paid: allocation.paid_off,
                timestamp: now,
            });
        }

        if !available.is_positive() {
            self.emit_payment_applied(amount, &application, now);
            return Ok(application);
        }

        self.remaining_amount -= amount;

        if self.remaining_amount.is_within(self.config.settlement_tolerance) {
            self.complete(amount, now);
            application.to_current_period = available;
            application.settled = true;
            self.emit_payment_applied(amount, &application, now);
            return Ok(application);
        }

        let today = now.date_naive();
        if let Some(index) = current_installment(&self.payment_schedules, self.billing_day(), today) {
            let applied = self.payment_schedules[index].apply(available);
            available -= applied;
            application.to_current_period = applied;
        }

        if available.is_positive() {
            if let Err(error) = self.respread_installments(now) {
                *self = snapshot.state;
                return Err(error);
            }
            application.to_future_periods = available;
        }

        self.emit_payment_applied(amount, &application, now);
        Ok(application)
    }

    /// rewrite every unpaid installment to the recalculated monthly payment
    fn respread_installments(&mut self, now: DateTime<Utc>) -> Result<()> {
        let new_payment = self.calculate_monthly_payment()?;
        let old_payment = self
            .payment_schedules
            .iter()
            .find(|s| !s.is_paid)
            .map(|s| s.amount)
            .unwrap_or(Money::ZERO);
        let unpaid = self.unpaid_installments();

        for schedule in self.payment_schedules.iter_mut().filter(|s| !s.is_paid) {
            schedule.reschedule(new_payment);
        }

        self.events.emit(Event::InstallmentsRecalculated {
            loan_id: self.id,
            old_payment,
            new_payment,
            unpaid_installments: unpaid,
            timestamp: now,
        });

        Ok(())
    }

    /// close out the loan once the balance is effectively zero
    fn complete(&mut self, final_payment: Money, now: DateTime<Utc>) {
        // sub-tolerance dust is written off
        self.remaining_amount = Money::ZERO;

        for schedule in &mut self.payment_schedules {
            schedule.settle();
        }

        self.update_status(LoanStatus::Completed, "balance repaid", now);

        self.events.emit(Event::LoanCompleted {
            loan_id: self.id,
            final_payment,
            timestamp: now,
        });
    }

    fn emit_payment_applied(&mut self, amount: Money, application: &PaymentApplication, now: DateTime<Utc>) {
        self.events.emit(Event::PaymentApplied {
            loan_id: self.id,
            amount,
            applied_to_penalties: application.to_penalties,
            applied_to_current_period: application.to_current_period,
            remaining_amount: self.remaining_amount,
            timestamp: now,
        });
    }

    /// true when every installment due up to the last billing day and every
    /// penalty has been paid
    pub fn have_last_months_fully_paid(&self, time_provider: &SafeTimeProvider) -> bool {
        let today = time_provider.now().date_naive();
        let penalties_paid = self.penalties.iter().all(|p| p.is_paid);

        let Some(last_due) = last_due_date(self.billing_day(), today) else {
            return penalties_paid;
        };

        let installments_paid = self
            .payment_schedules
            .iter()
            .filter(|s| s.payment_day <= last_due)
            .all(|s| s.is_paid);

        installments_paid && penalties_paid
    }

    /// amount still owed on the installment billed this period
    pub fn get_this_month_payment(&self, time_provider: &SafeTimeProvider) -> Money {
        let today = time_provider.now().date_naive();
        current_installment(&self.payment_schedules, self.billing_day(), today)
            .map(|index| self.payment_schedules[index].outstanding())
            .unwrap_or(Money::ZERO)
    }

    /// amount of the earliest installment nothing has been paid toward
    pub fn get_next_month_payment(&self) -> Money {
        if self.status == LoanStatus::Completed {
            return Money::ZERO;
        }

        self.payment_schedules
            .iter()
            .filter(|s| !s.is_paid && s.paid_amount.is_zero())
            .min_by_key(|s| s.payment_day)
            .map(|s| s.amount)
            .unwrap_or(Money::ZERO)
    }

    /// attach a penalty to this loan
    pub fn impose_penalty(&mut self, penalty: Penalty) -> Result<()> {
        if penalty.loan_id != self.id {
            return Err(LoanError::InvalidState {
                current: format!("penalty for loan {}", penalty.loan_id),
                expected: format!("penalty for loan {}", self.id),
            });
        }

        self.events.emit(Event::PenaltyImposed {
            loan_id: self.id,
            penalty_id: penalty.id,
            amount: penalty.amount,
            timestamp: penalty.imposed_date,
        });
        self.penalties.push(penalty);

        Ok(())
    }

    /// append to the payment log
    pub fn record_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    /// apply the approval decision to a pending loan
    pub fn decide(&mut self, approved: bool, time_provider: &SafeTimeProvider) -> Result<()> {
        if self.status != LoanStatus::Pending {
            return Err(LoanError::InvalidState {
                current: format!("{:?}", self.status),
                expected: format!("{:?}", LoanStatus::Pending),
            });
        }

        let now = time_provider.now();
        if approved {
            self.update_status(LoanStatus::Approved, "approved at application", now);
        } else {
            self.update_status(LoanStatus::Rejected, "rejected at application", now);
        }

        Ok(())
    }

    fn update_status(&mut self, new_status: LoanStatus, reason: &str, now: DateTime<Utc>) {
        let old_status = self.status;
        self.status = new_status;

        self.events.emit(Event::StatusChanged {
            loan_id: self.id,
            old_status,
            new_status,
            reason: reason.to_string(),
            timestamp: now,
        });
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

/// builder for loans
pub struct LoanBuilder {
    client_id: Option<ClientId>,
    name: Option<String>,
    amount: Option<Money>,
    rate: Option<Rate>,
    duration_in_months: Option<u32>,
    start_date: Option<NaiveDate>,
    config: Option<LoanConfig>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self {
            client_id: None,
            name: None,
            amount: None,
            rate: None,
            duration_in_months: None,
            start_date: None,
            config: None,
        }
    }

    pub fn client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn duration_in_months(mut self, months: u32) -> Self {
        self.duration_in_months = Some(months);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn config(mut self, config: LoanConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// validate the terms and build a pending loan
    pub fn build(self) -> Result<Loan> {
        let amount = self.amount.ok_or(LoanError::InvalidTerms {
            message: "Amount required".to_string(),
        })?;

        let rate = self.rate.ok_or(LoanError::InvalidTerms {
            message: "Rate required".to_string(),
        })?;

        let duration = self.duration_in_months.ok_or(LoanError::InvalidTerms {
            message: "Duration required".to_string(),
        })?;

        let start_date = self.start_date.ok_or(LoanError::InvalidTerms {
            message: "Start date required".to_string(),
        })?;

        let terms = LoanTerms::new(
            self.name.unwrap_or_else(|| "Loan".to_string()),
            amount,
            rate,
            duration,
            start_date,
        );
        terms.validate()?;

        Ok(Loan::new(
            self.client_id.unwrap_or_else(Uuid::new_v4),
            terms,
            self.config.unwrap_or_default(),
        ))
    }
}

impl Default for LoanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
