//! Editable multi-recipient batch, validated before it is frozen into
//! [`TransferRequest`]s.

use crate::error::SplitchainError;
use crate::types::{Currency, TransferRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One editable row, kept as raw text until the draft is frozen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRow {
    pub recipient: String,
    pub amount: String,
    pub currency: String,
}

impl DraftRow {
    pub fn new(
        recipient: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            currency: currency.into(),
        }
    }

    fn parse(&self, index: usize) -> Result<TransferRequest, SplitchainError> {
        let amount: Decimal = self.amount.trim().parse().map_err(|_| {
            SplitchainError::validation(
                Some(index),
                format!("amount '{}' is not a number", self.amount),
            )
        })?;
        let currency: Currency = self.currency.parse().map_err(|_| {
            SplitchainError::validation(
                Some(index),
                format!("unsupported currency '{}'", self.currency.trim()),
            )
        })?;
        let request = TransferRequest::new(self.recipient.trim(), amount, currency);
        request.validate(index)?;
        Ok(request)
    }
}

/// A problem with one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftIssue {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchDraft {
    rows: Vec<DraftRow>,
}

impl BatchDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[DraftRow] {
        &self.rows
    }

    pub fn add_row(&mut self, row: DraftRow) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, index: usize) -> Result<DraftRow, SplitchainError> {
        if index >= self.rows.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.rows.remove(index))
    }

    pub fn update_row(&mut self, index: usize, row: DraftRow) -> Result<(), SplitchainError> {
        let len = self.rows.len();
        let slot = self
            .rows
            .get_mut(index)
            .ok_or_else(|| Self::range_error(index, len))?;
        *slot = row;
        Ok(())
    }

    /// Every row problem, form-style. Empty means the draft can be frozen.
    pub fn validate(&self) -> Vec<DraftIssue> {
        let mut issues = Vec::new();
        if self.rows.is_empty() {
            issues.push(DraftIssue {
                index: 0,
                message: "add at least one recipient".to_string(),
            });
        }
        for (index, row) in self.rows.iter().enumerate() {
            if let Err(err) = row.parse(index) {
                let message = match err {
                    SplitchainError::Validation { reason, .. } => reason,
                    other => other.to_string(),
                };
                issues.push(DraftIssue { index, message });
            }
        }
        issues
    }

    /// Consume the draft. Fails on the first invalid row.
    pub fn freeze(self) -> Result<Vec<TransferRequest>, SplitchainError> {
        if self.rows.is_empty() {
            return Err(SplitchainError::validation(None, "batch is empty"));
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| row.parse(index))
            .collect()
    }

    fn out_of_range(&self, index: usize) -> SplitchainError {
        Self::range_error(index, self.rows.len())
    }

    fn range_error(index: usize, len: usize) -> SplitchainError {
        SplitchainError::validation(
            Some(index),
            format!("row index out of range (draft has {} rows)", len),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_rows_by_index() {
        let mut draft = BatchDraft::new();
        draft.add_row(DraftRow::new("alice.eth", "1", "ETH"));
        draft.add_row(DraftRow::new("bob.eth", "2", "USDC"));
        draft.add_row(DraftRow::new("carol.eth", "3", "ZORA"));

        let removed = draft.remove_row(1).unwrap();
        assert_eq!(removed.recipient, "bob.eth");
        assert_eq!(draft.rows().len(), 2);
        assert_eq!(draft.rows()[1].recipient, "carol.eth");
        assert!(draft.remove_row(5).is_err());
    }

    #[test]
    fn validate_reports_every_bad_row() {
        let mut draft = BatchDraft::new();
        draft.add_row(DraftRow::new("", "1", "ETH"));
        draft.add_row(DraftRow::new("bob.eth", "2", "USDC"));
        draft.add_row(DraftRow::new("carol.eth", "-3", "ETH"));
        draft.add_row(DraftRow::new("dave.eth", "abc", "DOGE"));

        let issues = draft.validate();
        let indexes: Vec<usize> = issues.iter().map(|issue| issue.index).collect();
        assert_eq!(indexes, vec![0, 2, 3]);
    }

    #[test]
    fn freeze_produces_requests_in_row_order() {
        let mut draft = BatchDraft::new();
        draft.add_row(DraftRow::new(" alice.eth ", "0.5", "eth"));
        draft.add_row(DraftRow::new("bob.eth", "1500", "USDC"));
        draft
            .update_row(1, DraftRow::new("bob.eth", "75", "USDT"))
            .unwrap();

        let requests = draft.freeze().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].recipient, "alice.eth");
        assert_eq!(requests[0].amount, Decimal::new(5, 1));
        assert_eq!(requests[1].currency, Currency::Usdt);
        assert_eq!(requests[1].amount, Decimal::from(75));
    }

    #[test]
    fn empty_or_invalid_draft_does_not_freeze() {
        assert!(BatchDraft::new().freeze().is_err());

        let mut draft = BatchDraft::new();
        draft.add_row(DraftRow::new("alice.eth", "0", "ETH"));
        let err = draft.freeze().unwrap_err();
        assert!(matches!(
            err,
            SplitchainError::Validation { index: Some(0), .. }
        ));
    }
}
