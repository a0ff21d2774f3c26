use crate::error::SplitchainError;
use serde::{Deserialize, Serialize};

/// Stages a batch moves through inside `Disperser::disperse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Validating,
    Resolving,
    Gating,
    SkippingGate,
    Disbursing,
    Completed,
    Aborted,
}

impl BatchStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Resolving => "resolving",
            Self::Gating => "gating",
            Self::SkippingGate => "skipping_gate",
            Self::Disbursing => "disbursing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

/// Enforces validating->resolving->(gating|skipping_gate)->disbursing->completed,
/// with `aborted` reachable from every non-terminal stage.
#[derive(Debug, Clone)]
pub struct BatchStageMachine {
    batch_id: String,
    stage: BatchStage,
    visited: Vec<BatchStage>,
}

impl BatchStageMachine {
    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            stage: BatchStage::Validating,
            visited: vec![BatchStage::Validating],
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn stage(&self) -> BatchStage {
        self.stage
    }

    /// Every stage entered so far, in order.
    pub fn visited(&self) -> &[BatchStage] {
        &self.visited
    }

    pub fn start_resolving(&mut self) -> Result<(), SplitchainError> {
        self.transition(BatchStage::Resolving)
    }

    pub fn start_gating(&mut self) -> Result<(), SplitchainError> {
        self.transition(BatchStage::Gating)
    }

    pub fn skip_gate(&mut self) -> Result<(), SplitchainError> {
        self.transition(BatchStage::SkippingGate)
    }

    pub fn start_disbursing(&mut self) -> Result<(), SplitchainError> {
        self.transition(BatchStage::Disbursing)
    }

    pub fn complete(&mut self) -> Result<(), SplitchainError> {
        self.transition(BatchStage::Completed)
    }

    pub fn abort(&mut self) -> Result<(), SplitchainError> {
        self.transition(BatchStage::Aborted)
    }

    /// Abort unless the batch already reached a terminal stage. Returns
    /// whether the stage changed.
    pub fn abort_if_active(&mut self) -> bool {
        if self.stage.is_terminal() {
            return false;
        }
        self.stage = BatchStage::Aborted;
        self.visited.push(BatchStage::Aborted);
        true
    }

    fn transition(&mut self, next: BatchStage) -> Result<(), SplitchainError> {
        let allowed = matches!(
            (self.stage, next),
            (BatchStage::Validating, BatchStage::Resolving)
                | (BatchStage::Resolving, BatchStage::Gating)
                | (BatchStage::Resolving, BatchStage::SkippingGate)
                | (BatchStage::Gating, BatchStage::Disbursing)
                | (BatchStage::SkippingGate, BatchStage::Disbursing)
                | (BatchStage::Disbursing, BatchStage::Completed)
        ) || (next == BatchStage::Aborted && !self.stage.is_terminal());

        if !allowed {
            return Err(SplitchainError::stage_violation(
                self.stage.name(),
                next.name(),
            ));
        }

        self.stage = next;
        self.visited.push(next);
        Ok(())
    }
}
