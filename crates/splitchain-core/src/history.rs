use crate::types::TransactionRecord;
use serde::Serialize;

/// Caller-held list of completed disbursements, newest batch first.
///
/// Records are only ever added; nothing here edits an existing record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionHistory {
    entries: Vec<TransactionRecord>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(entries: Vec<TransactionRecord>) -> Self {
        Self { entries }
    }

    /// Put a completed batch in front of everything recorded so far, keeping
    /// its submission order.
    pub fn record_batch(&mut self, batch: &[TransactionRecord]) {
        if batch.is_empty() {
            return;
        }
        self.entries.splice(0..0, batch.iter().cloned());
    }

    pub fn entries(&self) -> &[TransactionRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page(&self, offset: usize, limit: usize) -> &[TransactionRecord] {
        let start = offset.min(self.entries.len());
        let end = start.saturating_add(limit).min(self.entries.len());
        &self.entries[start..end]
    }
}
