pub mod memory;
pub mod ports;
pub mod service;

pub use memory::InMemoryLedger;
pub use ports::{
    ApproveAll, ClientEligibility, ClientRepository, CreditScoreStrategy, FixedCreditScore,
    LedgerStore, LoanApprovalPolicy, LoanRepository, LoggingRefundSink, MinimumAge,
    PaymentRepository, PenaltyRepository, Refund, RefundSink,
};
pub use service::{LoanService, PaymentReceipt, PenaltyReceipt};
