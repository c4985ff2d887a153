pub mod client;
pub mod config;
pub mod decimal;
pub mod delinquency;
pub mod errors;
pub mod events;
pub mod loan;
pub mod payments;
pub mod penalty;
pub mod schedule;
pub mod servicing;
pub mod state;
pub mod types;
pub mod view;

// re-export key types
pub use client::Client;
pub use config::{LoanConfig, LoanTerms, PenaltyConfig, ServicingConfig};
pub use decimal::{Money, Rate};
pub use delinquency::{DelinquencyScanner, ImposedPenalty, ScanFailure, ScanReport};
pub use errors::{ErrorKind, LoanError, Result};
pub use events::{Event, EventStore};
pub use loan::{Loan, LoanBuilder};
pub use payments::{monthly_payment, Payment};
pub use penalty::{Penalty, LATE_PAYMENT_REASON};
pub use schedule::PaymentSchedule;
pub use servicing::{InMemoryLedger, LoanService, PaymentReceipt, PenaltyReceipt};
pub use state::LoanSnapshot;
pub use types::{ClientId, LoanId, LoanStatus, PaymentApplication};
pub use view::{LoanStatusView, LoanView};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
