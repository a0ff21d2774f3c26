use crate::cancel::CancelToken;
use crate::error::SplitchainError;
use crate::executor::{verify_records, DisbursementExecutor};
use crate::flow::BatchStageMachine;
use crate::resolver::{AddressResolver, NameService};
use crate::risk::{GateDecision, RiskGate, RiskOracle};
use crate::types::{BatchResult, DisperseRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Timeouts applied to the external calls of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisperserConfig {
    /// Per-call risk oracle budget. Expiry fails the whole batch.
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,

    /// Per-alias naming lookup budget. Expiry is a resolution failure.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for DisperserConfig {
    fn default() -> Self {
        Self {
            oracle_timeout_ms: default_oracle_timeout_ms(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

fn default_oracle_timeout_ms() -> u64 {
    30_000
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

/// Batch orchestrator: validation, resolution, risk gating and disbursement,
/// strictly in that order.
pub struct Disperser {
    resolver: AddressResolver,
    gate: RiskGate,
    executor: Arc<dyn DisbursementExecutor>,
}

impl Disperser {
    pub fn new(
        names: Arc<dyn NameService>,
        oracle: Arc<dyn RiskOracle>,
        executor: Arc<dyn DisbursementExecutor>,
        config: DisperserConfig,
    ) -> Self {
        Self {
            resolver: AddressResolver::new(names, Duration::from_millis(config.lookup_timeout_ms)),
            gate: RiskGate::new(oracle, Duration::from_millis(config.oracle_timeout_ms)),
            executor,
        }
    }

    pub fn name_service_id(&self) -> &'static str {
        self.resolver.service_id()
    }

    pub fn oracle_id(&self) -> &'static str {
        self.gate.oracle_id()
    }

    pub fn executor_id(&self) -> &'static str {
        self.executor.executor_id()
    }

    /// Single batch entrypoint.
    ///
    /// Always returns a `BatchResult`; faults from any collaborator are
    /// reported as `BatchResult::Failed`, never propagated.
    pub async fn disperse(&self, request: DisperseRequest) -> BatchResult {
        self.disperse_with_cancel(request, &CancelToken::never())
            .await
    }

    pub async fn disperse_with_cancel(
        &self,
        request: DisperseRequest,
        cancel: &CancelToken,
    ) -> BatchResult {
        let batch_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("disperse", batch_id = %batch_id);

        async move {
            let mut stages = BatchStageMachine::new(batch_id);
            info!(
                transfers = request.transfers.len(),
                bypass_risk_check = request.bypass_risk_check,
                "batch submitted"
            );

            match self.run(&request, &mut stages, cancel).await {
                Ok(result) => {
                    info!(stage = stages.stage().name(), success = result.is_success(), "batch finished");
                    result
                }
                Err(err) => {
                    let failed_in = stages.stage().name();
                    if !stages.abort_if_active() {
                        debug!(stage = failed_in, "batch already terminal when the error surfaced");
                    }
                    warn!(stage = failed_in, error = %err, "batch aborted");
                    BatchResult::failed(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &DisperseRequest,
        stages: &mut BatchStageMachine,
        cancel: &CancelToken,
    ) -> Result<BatchResult, SplitchainError> {
        request.validate()?;

        stages.start_resolving()?;
        let resolved = self
            .resolver
            .resolve_batch(&request.sender_address, &request.transfers, cancel)
            .await?;

        if request.bypass_risk_check {
            stages.skip_gate()?;
            info!("risk check bypassed by caller");
        } else {
            stages.start_gating()?;
            match self.gate.screen_batch(&resolved, cancel).await? {
                GateDecision::Cleared { evaluated } => {
                    debug!(evaluated, "risk gate cleared batch");
                }
                GateDecision::Blocked {
                    transfer, verdict, ..
                } => {
                    stages.abort()?;
                    return Ok(BatchResult::RiskBlocked {
                        transfer_index: transfer.index,
                        recipient_identifier: transfer.recipient_identifier,
                        recipient_address: transfer.recipient_address,
                        explanation: verdict.explanation,
                    });
                }
            }
        }

        stages.start_disbursing()?;
        debug!(executor = self.executor.executor_id(), "handing batch to executor");
        let records = cancel
            .guard(self.executor.send(&resolved))
            .await?
            .map_err(|err| match err {
                SplitchainError::Execution(_) => err,
                other => SplitchainError::Execution(other.to_string()),
            })?;
        verify_records(&resolved, &records)?;

        stages.complete()?;
        Ok(BatchResult::Success {
            transactions: records,
        })
    }
}
