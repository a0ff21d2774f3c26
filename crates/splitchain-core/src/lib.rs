//! Splitchain core: batch disbursement behind a per-transfer risk gate.
//!
//! A batch is validated, every recipient is resolved to a canonical address,
//! each transfer is screened by an external risk oracle, and only a fully
//! cleared (or explicitly bypassed) batch reaches the disbursement executor.

#![deny(unsafe_code)]

pub mod address;
pub mod cancel;
pub mod draft;
pub mod error;
pub mod executor;
pub mod flow;
pub mod history;
pub mod orchestrator;
pub mod resolver;
pub mod risk;
pub mod types;

pub use address::{is_canonical_address, normalize_alias};
pub use cancel::{CancelHandle, CancelToken};
pub use draft::{BatchDraft, DraftIssue, DraftRow};
pub use error::SplitchainError;
pub use executor::{verify_records, DisbursementExecutor};
pub use flow::{BatchStage, BatchStageMachine};
pub use history::TransactionHistory;
pub use orchestrator::{Disperser, DisperserConfig};
pub use resolver::{AddressResolver, NameService};
pub use risk::{GateDecision, RiskGate, RiskOracle};
pub use types::{
    BatchFailure, BatchResult, Currency, DisperseRequest, ResolvedTransfer, RiskVerdict,
    TransactionRecord, TransferRequest,
};
