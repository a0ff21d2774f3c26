//! Collaborator adapters for Splitchain.

#![deny(unsafe_code)]

mod http;

pub mod executor;
pub mod fixtures;
pub mod naming;
pub mod oracle;

pub use executor::{AlwaysFailExecutor, SimulatedExecutor, DEFAULT_SIMULATED_DELAY};
pub use fixtures::{demo_history, demo_names, DEMO_SENDER};
pub use naming::{HttpNameService, StaticNameService};
pub use oracle::{parse_verdict, DenylistConfig, DenylistRiskOracle, LlmOracleConfig, LlmRiskOracle};
