use std::time::Duration;
use thiserror::Error;

/// Splitchain core errors.
#[derive(Debug, Error)]
pub enum SplitchainError {
    #[error("Invalid transfer{}: {reason}", index.map(|i| format!(" #{i}")).unwrap_or_default())]
    Validation { index: Option<usize>, reason: String },

    #[error("Could not resolve recipient '{identifier}': {reason}")]
    Resolution { identifier: String, reason: String },

    #[error("Risk oracle failed: {0}")]
    Oracle(String),

    #[error("Risk oracle timed out after {}ms", .0.as_millis())]
    OracleTimeout(Duration),

    #[error("Risk oracle returned a malformed verdict: {0}")]
    MalformedVerdict(String),

    #[error("Disbursement failed: {0}")]
    Execution(String),

    #[error("Batch was cancelled")]
    Cancelled,

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SplitchainError {
    pub fn validation(index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::Validation {
            index,
            reason: reason.into(),
        }
    }

    pub fn resolution(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    pub fn stage_violation(from: &str, to: &str) -> Self {
        Self::InvariantViolation(format!(
            "stage transition not allowed: '{}' -> '{}'",
            from, to
        ))
    }
}
