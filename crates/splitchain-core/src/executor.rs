use crate::error::SplitchainError;
use crate::types::{ResolvedTransfer, TransactionRecord};
use async_trait::async_trait;
use std::collections::HashSet;

/// Pluggable disbursement backend.
///
/// Implementations must be all-or-nothing: either every transfer is sent and
/// one record per transfer comes back in submission order, or an error is
/// returned and nothing is reported as sent.
#[async_trait]
pub trait DisbursementExecutor: Send + Sync {
    fn executor_id(&self) -> &'static str;

    async fn send(
        &self,
        transfers: &[ResolvedTransfer],
    ) -> Result<Vec<TransactionRecord>, SplitchainError>;
}

/// Check an executor's output against the batch it was given.
pub fn verify_records(
    transfers: &[ResolvedTransfer],
    records: &[TransactionRecord],
) -> Result<(), SplitchainError> {
    if transfers.len() != records.len() {
        return Err(SplitchainError::InvariantViolation(format!(
            "executor returned {} records for {} transfers",
            records.len(),
            transfers.len()
        )));
    }

    let mut hashes = HashSet::with_capacity(records.len());
    for (position, (transfer, record)) in transfers.iter().zip(records).enumerate() {
        if record.recipient_address != transfer.recipient_address
            || record.amount != transfer.amount
            || record.currency != transfer.currency
        {
            return Err(SplitchainError::InvariantViolation(format!(
                "record #{} does not match its transfer",
                position
            )));
        }
        if record.transaction_hash.is_empty() || !hashes.insert(record.transaction_hash.as_str()) {
            return Err(SplitchainError::InvariantViolation(format!(
                "record #{} has an empty or duplicate transaction hash",
                position
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn transfer(index: usize) -> ResolvedTransfer {
        ResolvedTransfer {
            index,
            recipient_identifier: format!("r{index}.eth"),
            recipient_address: format!("0x{:040x}", index + 1),
            amount: Decimal::from(index as u64 + 1),
            currency: Currency::Usdt,
            sender_address: "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B".to_string(),
        }
    }

    fn record_for(transfer: &ResolvedTransfer, hash: &str) -> TransactionRecord {
        TransactionRecord {
            recipient_address: transfer.recipient_address.clone(),
            amount: transfer.amount,
            currency: transfer.currency,
            timestamp: Utc::now(),
            transaction_hash: hash.to_string(),
        }
    }

    #[test]
    fn accepts_matching_records() {
        let transfers = vec![transfer(0), transfer(1)];
        let records = vec![record_for(&transfers[0], "0xa"), record_for(&transfers[1], "0xb")];
        assert!(verify_records(&transfers, &records).is_ok());
    }

    #[test]
    fn rejects_short_output() {
        let transfers = vec![transfer(0), transfer(1)];
        let records = vec![record_for(&transfers[0], "0xa")];
        assert!(verify_records(&transfers, &records).is_err());
    }

    #[test]
    fn rejects_reordered_output() {
        let transfers = vec![transfer(0), transfer(1)];
        let records = vec![record_for(&transfers[1], "0xa"), record_for(&transfers[0], "0xb")];
        assert!(verify_records(&transfers, &records).is_err());
    }

    #[test]
    fn rejects_duplicate_hashes() {
        let transfers = vec![transfer(0), transfer(1)];
        let records = vec![record_for(&transfers[0], "0xa"), record_for(&transfers[1], "0xa")];
        let err = verify_records(&transfers, &records).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
