use crate::address::{is_canonical_address, normalize_alias};
use crate::cancel::CancelToken;
use crate::error::SplitchainError;
use crate::types::{ResolvedTransfer, TransferRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// External naming service mapping human-readable aliases to addresses.
///
/// `Ok(None)` means the name is unknown. Callers treat it exactly like an error.
#[async_trait]
pub trait NameService: Send + Sync {
    fn service_id(&self) -> &'static str;

    async fn lookup(&self, alias: &str) -> Result<Option<String>, SplitchainError>;
}

/// Turns recipient identifiers into canonical addresses.
#[derive(Clone)]
pub struct AddressResolver {
    names: Arc<dyn NameService>,
    lookup_timeout: Duration,
}

impl AddressResolver {
    pub fn new(names: Arc<dyn NameService>, lookup_timeout: Duration) -> Self {
        Self {
            names,
            lookup_timeout,
        }
    }

    pub fn service_id(&self) -> &'static str {
        self.names.service_id()
    }

    /// Resolve one identifier. Canonical addresses pass through unchanged
    /// without touching the naming service.
    pub async fn resolve(&self, identifier: &str) -> Result<String, SplitchainError> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(SplitchainError::resolution(identifier, "identifier is empty"));
        }
        if is_canonical_address(trimmed) {
            return Ok(trimmed.to_string());
        }

        let alias = normalize_alias(trimmed).ok_or_else(|| {
            SplitchainError::resolution(identifier, "neither an address nor a recognised alias")
        })?;

        debug!(service = self.names.service_id(), alias = %alias, "looking up alias");
        let answer = tokio::time::timeout(self.lookup_timeout, self.names.lookup(&alias))
            .await
            .map_err(|_| {
                SplitchainError::resolution(
                    identifier,
                    format!("lookup timed out after {}ms", self.lookup_timeout.as_millis()),
                )
            })?;

        match answer {
            Ok(Some(address)) if is_canonical_address(&address) => Ok(address),
            Ok(Some(address)) => Err(SplitchainError::resolution(
                identifier,
                format!("naming service returned non-canonical address '{}'", address),
            )),
            Ok(None) => Err(SplitchainError::resolution(identifier, "name not found")),
            Err(err) => Err(SplitchainError::resolution(identifier, err.to_string())),
        }
    }

    /// Resolve a whole batch in submission order, stopping at the first failure.
    pub async fn resolve_batch(
        &self,
        sender_address: &str,
        transfers: &[TransferRequest],
        cancel: &CancelToken,
    ) -> Result<Vec<ResolvedTransfer>, SplitchainError> {
        let mut resolved = Vec::with_capacity(transfers.len());
        for (index, transfer) in transfers.iter().enumerate() {
            let recipient_address = cancel.guard(self.resolve(&transfer.recipient)).await??;
            debug!(index, recipient = %transfer.recipient, address = %recipient_address, "recipient resolved");
            resolved.push(ResolvedTransfer {
                index,
                recipient_identifier: transfer.recipient.clone(),
                recipient_address,
                amount: transfer.amount,
                currency: transfer.currency,
                sender_address: sender_address.to_string(),
            });
        }
        Ok(resolved)
    }
}
