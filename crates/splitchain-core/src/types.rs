use crate::address::{is_canonical_address, normalize_alias};
use crate::error::SplitchainError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported asset symbols. Serialized upper-case, parsed in any casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Currency {
    Eth,
    Zora,
    Usdc,
    Usdt,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Self::Eth, Self::Zora, Self::Usdc, Self::Usdt];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eth => "ETH",
            Self::Zora => "ZORA",
            Self::Usdc => "USDC",
            Self::Usdt => "USDT",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl From<Currency> for &'static str {
    fn from(currency: Currency) -> Self {
        currency.symbol()
    }
}

impl TryFrom<String> for Currency {
    type Error = SplitchainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Currency {
    type Err = SplitchainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|currency| currency.symbol().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                SplitchainError::validation(None, format!("unsupported currency '{}'", wanted))
            })
    }
}

/// One proposed payment as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Canonical address or human-readable alias.
    pub recipient: String,
    pub amount: Decimal,
    pub currency: Currency,
}

impl TransferRequest {
    pub fn new(recipient: impl Into<String>, amount: Decimal, currency: Currency) -> Self {
        Self {
            recipient: recipient.into(),
            amount,
            currency,
        }
    }

    /// Input-boundary checks. Never touches an external service.
    pub fn validate(&self, index: usize) -> Result<(), SplitchainError> {
        if self.recipient.trim().is_empty() {
            return Err(SplitchainError::validation(
                Some(index),
                "recipient must not be empty",
            ));
        }
        let recipient = self.recipient.trim();
        if !is_canonical_address(recipient) && normalize_alias(recipient).is_none() {
            return Err(SplitchainError::validation(
                Some(index),
                format!("recipient '{}' is neither an address nor an alias", recipient),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(SplitchainError::validation(
                Some(index),
                format!("amount must be positive, got {}", self.amount),
            ));
        }
        Ok(())
    }
}

/// A transfer whose recipient has been resolved to a canonical address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTransfer {
    pub index: usize,
    pub recipient_identifier: String,
    pub recipient_address: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub sender_address: String,
}

/// Oracle judgement for one resolved transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub is_safe: bool,
    pub explanation: String,
}

impl RiskVerdict {
    pub fn safe(explanation: impl Into<String>) -> Self {
        Self {
            is_safe: true,
            explanation: explanation.into(),
        }
    }

    pub fn unsafe_because(explanation: impl Into<String>) -> Self {
        Self {
            is_safe: false,
            explanation: explanation.into(),
        }
    }

    /// Unsafe verdicts must carry an explanation the user can read.
    pub fn check(&self) -> Result<(), SplitchainError> {
        if !self.is_safe && self.explanation.trim().is_empty() {
            return Err(SplitchainError::MalformedVerdict(
                "unsafe verdict without explanation".to_string(),
            ));
        }
        Ok(())
    }
}

/// Completed disbursement for one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub recipient_address: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub timestamp: DateTime<Utc>,
    pub transaction_hash: String,
}

/// Batch submission entering `Disperser::disperse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisperseRequest {
    pub sender_address: String,
    pub transfers: Vec<TransferRequest>,
    #[serde(default)]
    pub bypass_risk_check: bool,
}

impl DisperseRequest {
    pub fn new(sender_address: impl Into<String>, transfers: Vec<TransferRequest>) -> Self {
        Self {
            sender_address: sender_address.into(),
            transfers,
            bypass_risk_check: false,
        }
    }

    /// "Send anyway": skip the risk gate for the whole batch.
    pub fn bypassing_risk_check(mut self) -> Self {
        self.bypass_risk_check = true;
        self
    }

    pub fn validate(&self) -> Result<(), SplitchainError> {
        if self.transfers.is_empty() {
            return Err(SplitchainError::validation(None, "batch is empty"));
        }
        if !is_canonical_address(&self.sender_address) {
            return Err(SplitchainError::validation(
                None,
                format!("sender '{}' is not a canonical address", self.sender_address),
            ));
        }
        for (index, transfer) in self.transfers.iter().enumerate() {
            transfer.validate(index)?;
        }
        Ok(())
    }
}

/// Why a batch failed without being risk-blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchFailure {
    Validation { index: Option<usize>, reason: String },
    Resolution { identifier: String },
    Execution,
    Cancelled,
}

/// Outcome of one `disperse` call. Exactly one shape is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchResult {
    Success {
        transactions: Vec<TransactionRecord>,
    },
    RiskBlocked {
        transfer_index: usize,
        recipient_identifier: String,
        recipient_address: String,
        explanation: String,
    },
    Failed {
        failure: BatchFailure,
        error: String,
    },
}

impl BatchResult {
    pub fn failed(err: &SplitchainError) -> Self {
        let failure = match err {
            SplitchainError::Validation { index, reason } => BatchFailure::Validation {
                index: *index,
                reason: reason.clone(),
            },
            SplitchainError::Resolution { identifier, .. } => BatchFailure::Resolution {
                identifier: identifier.clone(),
            },
            SplitchainError::Cancelled => BatchFailure::Cancelled,
            _ => BatchFailure::Execution,
        };
        Self::Failed {
            failure,
            error: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Records of a successful batch; empty for every other outcome.
    pub fn transactions(&self) -> &[TransactionRecord] {
        match self {
            Self::Success { transactions } => transactions,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!("usdc".parse::<Currency>().unwrap(), Currency::Usdc);
        assert_eq!(" ZORA ".parse::<Currency>().unwrap(), Currency::Zora);
        assert!("DOGE".parse::<Currency>().is_err());
    }

    #[test]
    fn request_validation_rejects_non_positive_amounts() {
        let request = DisperseRequest::new(
            SENDER,
            vec![
                TransferRequest::new("alice.eth", dec("1.5"), Currency::Eth),
                TransferRequest::new("bob.eth", dec("0"), Currency::Eth),
            ],
        );
        let err = request.validate().unwrap_err();
        assert!(matches!(
            err,
            SplitchainError::Validation { index: Some(1), .. }
        ));
    }

    #[test]
    fn request_validation_requires_canonical_sender() {
        let request = DisperseRequest::new(
            "me.eth",
            vec![TransferRequest::new("alice.eth", dec("1"), Currency::Eth)],
        );
        assert!(request.validate().is_err());

        let empty = DisperseRequest::new(SENDER, Vec::new());
        assert!(empty.validate().unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn request_validation_rejects_malformed_recipient() {
        let request = DisperseRequest::new(
            SENDER,
            vec![
                TransferRequest::new("alice.eth", dec("1"), Currency::Eth),
                TransferRequest::new("not an address!!", dec("1"), Currency::Eth),
            ],
        );
        let err = request.validate().unwrap_err();
        assert!(matches!(
            err,
            SplitchainError::Validation { index: Some(1), .. }
        ));
        assert!(err.to_string().contains("not an address!!"));
    }

    #[test]
    fn currency_json_accepts_any_casing() {
        let mixed: TransferRequest = serde_json::from_value(serde_json::json!({
            "recipient": "alice.eth",
            "amount": "1",
            "currency": "Usdc"
        }))
        .unwrap();
        assert_eq!(mixed.currency, Currency::Usdc);

        let eth: Currency = serde_json::from_str("\"eTh\"").unwrap();
        assert_eq!(eth, Currency::Eth);
        assert_eq!(serde_json::to_string(&Currency::Zora).unwrap(), "\"ZORA\"");
        assert!(serde_json::from_str::<Currency>("\"DOGE\"").is_err());
    }

    #[test]
    fn unsafe_verdict_requires_explanation() {
        assert!(RiskVerdict::unsafe_because("  ").check().is_err());
        assert!(RiskVerdict::unsafe_because("known drainer").check().is_ok());
        assert!(RiskVerdict::safe("").check().is_ok());
    }

    #[test]
    fn batch_result_serializes_as_tagged_variant() {
        let blocked = BatchResult::RiskBlocked {
            transfer_index: 0,
            recipient_identifier: "scam.eth".to_string(),
            recipient_address: "0x0000000000000000000000000000000000000001".to_string(),
            explanation: "address linked to phishing".to_string(),
        };
        let value = serde_json::to_value(&blocked).unwrap();
        assert_eq!(value["outcome"], "risk_blocked");
        assert_eq!(value["explanation"], "address linked to phishing");
        assert!(value.get("transactions").is_none());

        let failed = BatchResult::failed(&SplitchainError::resolution("scam.eth", "not found"));
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["failure"]["kind"], "resolution");
        assert_eq!(value["failure"]["identifier"], "scam.eth");
        assert!(failed.transactions().is_empty());
    }

    #[test]
    fn transfer_request_accepts_numeric_or_string_amounts() {
        let from_number: TransferRequest = serde_json::from_value(serde_json::json!({
            "recipient": "alice.eth",
            "amount": 2.5,
            "currency": "ETH"
        }))
        .unwrap();
        let from_string: TransferRequest = serde_json::from_value(serde_json::json!({
            "recipient": "alice.eth",
            "amount": "2.5",
            "currency": "eth"
        }))
        .unwrap();
        assert_eq!(from_number, from_string);
    }
}
