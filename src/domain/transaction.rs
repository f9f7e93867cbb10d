use crate::domain::account::AccountId;
use crate::domain::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    TransferOut,
    TransferIn,
}

/// A committed monetary event, one per balance mutation.
///
/// Records are immutable once appended; the ledger never edits or removes
/// them. A logical transfer produces two records with equal amounts, a
/// `TransferOut` on the sender and a `TransferIn` on the recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger-assigned id, monotonically increasing and unique.
    pub id: u64,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Amount,
    /// Assigned at append, non-decreasing across the ledger.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::TransferOut).unwrap(),
            "\"transfer_out\""
        );
        assert_eq!(
            serde_json::from_str::<TransactionKind>("\"deposit\"").unwrap(),
            TransactionKind::Deposit
        );
    }

    #[test]
    fn test_transaction_serde_roundtrip() {
        let tx = Transaction {
            id: 9,
            account_id: AccountId(1),
            kind: TransactionKind::Withdraw,
            amount: Amount::new(250).unwrap(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
