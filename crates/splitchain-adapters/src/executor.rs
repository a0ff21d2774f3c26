//! Disbursement executors.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use splitchain_core::{DisbursementExecutor, ResolvedTransfer, SplitchainError, TransactionRecord};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(1500);

/// Stand-in for a chain client: waits, then fabricates one transaction hash
/// per transfer. Nothing leaves the process.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    delay: Duration,
}

impl SimulatedExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No artificial latency.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

#[async_trait]
impl DisbursementExecutor for SimulatedExecutor {
    fn executor_id(&self) -> &'static str {
        "simulated"
    }

    async fn send(
        &self,
        transfers: &[ResolvedTransfer],
    ) -> Result<Vec<TransactionRecord>, SplitchainError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let timestamp = Utc::now();
        let mut rng = rand::thread_rng();
        let mut seen = HashSet::with_capacity(transfers.len());
        let records: Vec<TransactionRecord> = transfers
            .iter()
            .map(|transfer| {
                let mut hash = random_hash(&mut rng);
                while !seen.insert(hash.clone()) {
                    hash = random_hash(&mut rng);
                }
                TransactionRecord {
                    recipient_address: transfer.recipient_address.clone(),
                    amount: transfer.amount,
                    currency: transfer.currency,
                    timestamp,
                    transaction_hash: hash,
                }
            })
            .collect();

        info!(transfers = records.len(), "simulated disbursement sent");
        Ok(records)
    }
}

/// `0x` followed by 64 lower-case hex digits.
fn random_hash(rng: &mut impl Rng) -> String {
    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for _ in 0..32 {
        hash.push_str(&format!("{:02x}", rng.gen::<u8>()));
    }
    hash
}

/// Deterministic failing executor useful for chaos testing.
#[derive(Debug, Clone)]
pub struct AlwaysFailExecutor {
    reason: String,
}

impl AlwaysFailExecutor {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DisbursementExecutor for AlwaysFailExecutor {
    fn executor_id(&self) -> &'static str {
        "always-fail"
    }

    async fn send(
        &self,
        _transfers: &[ResolvedTransfer],
    ) -> Result<Vec<TransactionRecord>, SplitchainError> {
        Err(SplitchainError::Execution(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use splitchain_core::{verify_records, Currency};

    fn transfers(count: usize) -> Vec<ResolvedTransfer> {
        (0..count)
            .map(|index| ResolvedTransfer {
                index,
                recipient_identifier: format!("r{index}.eth"),
                recipient_address: format!("0x{:040x}", index + 1),
                amount: Decimal::new(15, 1),
                currency: Currency::Zora,
                sender_address: "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B".to_string(),
            })
            .collect()
    }

    #[test]
    fn hashes_are_prefixed_lowercase_hex() {
        let hash = random_hash(&mut rand::thread_rng());
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert!(hash[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_executor_waits_then_returns_matching_records() {
        let batch = transfers(5);
        let started = tokio::time::Instant::now();
        let records = SimulatedExecutor::default().send(&batch).await.unwrap();

        assert!(started.elapsed() >= DEFAULT_SIMULATED_DELAY);
        assert!(verify_records(&batch, &records).is_ok());
    }

    #[tokio::test]
    async fn always_fail_reports_execution_error() {
        let err = AlwaysFailExecutor::new("rpc unreachable")
            .send(&transfers(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SplitchainError::Execution(_)));
    }
}
