use crate::cancel::CancelToken;
use crate::error::SplitchainError;
use crate::types::{ResolvedTransfer, RiskVerdict};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// External risk-evaluation oracle. Its verdict is authoritative.
#[async_trait]
pub trait RiskOracle: Send + Sync {
    fn oracle_id(&self) -> &'static str;

    async fn evaluate(&self, transfer: &ResolvedTransfer) -> Result<RiskVerdict, SplitchainError>;
}

/// Result of screening a batch through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Every transfer was judged safe.
    Cleared { evaluated: usize },
    /// The first unsafe transfer; later transfers were never sent to the oracle.
    Blocked {
        transfer: ResolvedTransfer,
        verdict: RiskVerdict,
        evaluated: usize,
    },
}

impl GateDecision {
    /// Number of oracle calls made while screening.
    pub fn evaluated(&self) -> usize {
        match self {
            Self::Cleared { evaluated } | Self::Blocked { evaluated, .. } => *evaluated,
        }
    }
}

/// Per-transfer safety check in front of disbursement.
///
/// One oracle call per transfer, no retries. A timeout or a verdict that breaks
/// the explanation invariant is a hard failure, never a silent allow.
#[derive(Clone)]
pub struct RiskGate {
    oracle: Arc<dyn RiskOracle>,
    oracle_timeout: Duration,
}

impl RiskGate {
    pub fn new(oracle: Arc<dyn RiskOracle>, oracle_timeout: Duration) -> Self {
        Self {
            oracle,
            oracle_timeout,
        }
    }

    pub fn oracle_id(&self) -> &'static str {
        self.oracle.oracle_id()
    }

    pub async fn assess(&self, transfer: &ResolvedTransfer) -> Result<RiskVerdict, SplitchainError> {
        let verdict = tokio::time::timeout(self.oracle_timeout, self.oracle.evaluate(transfer))
            .await
            .map_err(|_| SplitchainError::OracleTimeout(self.oracle_timeout))??;
        verdict.check()?;
        Ok(verdict)
    }

    /// Evaluate transfers in order and stop at the first unsafe verdict.
    pub async fn screen_batch(
        &self,
        transfers: &[ResolvedTransfer],
        cancel: &CancelToken,
    ) -> Result<GateDecision, SplitchainError> {
        let mut evaluated = 0;
        for transfer in transfers {
            let verdict = cancel.guard(self.assess(transfer)).await??;
            evaluated += 1;

            if !verdict.is_safe {
                warn!(
                    oracle = self.oracle_id(),
                    index = transfer.index,
                    recipient = %transfer.recipient_address,
                    explanation = %verdict.explanation,
                    "transfer judged unsafe"
                );
                return Ok(GateDecision::Blocked {
                    transfer: transfer.clone(),
                    verdict,
                    evaluated,
                });
            }
            debug!(index = transfer.index, "transfer judged safe");
        }
        Ok(GateDecision::Cleared { evaluated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedOracle {
        unsafe_at: Option<usize>,
        explanation: &'static str,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(unsafe_at: Option<usize>) -> Self {
            Self {
                unsafe_at,
                explanation: "recipient linked to a drainer contract",
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RiskOracle for ScriptedOracle {
        fn oracle_id(&self) -> &'static str {
            "scripted"
        }

        async fn evaluate(&self, transfer: &ResolvedTransfer) -> Result<RiskVerdict, SplitchainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(transfer.index) == self.unsafe_at {
                Ok(RiskVerdict::unsafe_because(self.explanation))
            } else {
                Ok(RiskVerdict::safe("looks fine"))
            }
        }
    }

    struct HangingOracle;

    #[async_trait]
    impl RiskOracle for HangingOracle {
        fn oracle_id(&self) -> &'static str {
            "hanging"
        }

        async fn evaluate(&self, _transfer: &ResolvedTransfer) -> Result<RiskVerdict, SplitchainError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RiskVerdict::safe("too late"))
        }
    }

    fn transfers(count: usize) -> Vec<ResolvedTransfer> {
        (0..count)
            .map(|index| ResolvedTransfer {
                index,
                recipient_identifier: format!("r{index}.eth"),
                recipient_address: format!("0x{:040x}", index + 1),
                amount: Decimal::ONE,
                currency: Currency::Eth,
                sender_address: "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn clears_batch_when_every_verdict_is_safe() {
        let oracle = Arc::new(ScriptedOracle::new(None));
        let gate = RiskGate::new(oracle.clone(), Duration::from_secs(5));
        let decision = gate
            .screen_batch(&transfers(3), &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::Cleared { evaluated: 3 });
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_first_unsafe_transfer() {
        let oracle = Arc::new(ScriptedOracle::new(Some(1)));
        let gate = RiskGate::new(oracle.clone(), Duration::from_secs(5));
        let decision = gate
            .screen_batch(&transfers(4), &CancelToken::never())
            .await
            .unwrap();
        match decision {
            GateDecision::Blocked {
                transfer,
                verdict,
                evaluated,
            } => {
                assert_eq!(transfer.index, 1);
                assert_eq!(verdict.explanation, "recipient linked to a drainer contract");
                assert_eq!(evaluated, 2);
            }
            other => panic!("unexpected decision {other:?}"),
        }
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsafe_verdict_without_explanation_is_a_fault() {
        let oracle = Arc::new(ScriptedOracle {
            explanation: "",
            ..ScriptedOracle::new(Some(0))
        });
        let gate = RiskGate::new(oracle, Duration::from_secs(5));
        let err = gate
            .screen_batch(&transfers(1), &CancelToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, SplitchainError::MalformedVerdict(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn oracle_timeout_is_a_hard_failure() {
        let gate = RiskGate::new(Arc::new(HangingOracle), Duration::from_secs(30));
        let err = gate.assess(&transfers(1)[0]).await.unwrap_err();
        assert!(matches!(err, SplitchainError::OracleTimeout(_)));
    }
}
