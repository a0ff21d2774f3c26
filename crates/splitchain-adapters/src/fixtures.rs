//! Demo data for local runs.

use crate::naming::StaticNameService;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use splitchain_core::{Currency, TransactionHistory, TransactionRecord};

/// Sender used by the demo wallet.
pub const DEMO_SENDER: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";

const DEMO_HASH_BASE: u64 = 0xd15e_0000;

/// (recipient, amount mantissa, scale, currency, hours ago)
const DEMO_TRANSACTIONS: [(&str, i64, u32, Currency, i64); 6] = [
    ("0x1a2B3c4d5E6f7a8B9c0D1e2F3a4b5c6d7e8f9a0B", 5, 1, Currency::Eth, 2),
    ("0x2b3C4d5e6F7a8b9C0d1e2f3A4b5c6d7E8f9a0b1C", 1500, 0, Currency::Usdc, 5),
    ("0x3c4D5e6f7a8B9c0d1e2F3a4b5C6d7e8F9a0b1c2D", 12, 1, Currency::Zora, 10),
    ("0x4d5E6f7a8b9C0d1e2F3a4b5c6D7e8f9a0b1C2d3E", 500, 0, Currency::Usdt, 24),
    ("0x5e6F7a8b9c0d1e2F3a4b5c6d7e8F9a0b1c2d3e4F", 21, 1, Currency::Eth, 48),
    ("0x6f7A8b9c0d1e2F3a4b5c6d7e8F9a0b1c2d3e4f5A", 75, 0, Currency::Usdc, 72),
];

/// Six past disbursements spread over the last three days, newest first.
pub fn demo_history() -> TransactionHistory {
    let now = Utc::now();
    let records = DEMO_TRANSACTIONS
        .iter()
        .enumerate()
        .map(|(position, (recipient, mantissa, scale, currency, hours_ago))| TransactionRecord {
            recipient_address: recipient.to_string(),
            amount: Decimal::new(*mantissa, *scale),
            currency: *currency,
            timestamp: now - Duration::hours(*hours_ago),
            transaction_hash: format!("0x{:064x}", DEMO_HASH_BASE + position as u64),
        })
        .collect();
    TransactionHistory::from_records(records)
}

/// Small alias table so the demo can be driven with names instead of hex.
pub fn demo_names() -> StaticNameService {
    StaticNameService::from_entries([
        ("vitalik.eth", "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
        ("alice.eth", "0x1a2B3c4d5E6f7a8B9c0D1e2F3a4b5c6d7e8f9a0B"),
        ("bob.eth", "0x2b3C4d5e6F7a8b9C0d1e2f3A4b5c6d7E8f9a0b1C"),
    ])
}
