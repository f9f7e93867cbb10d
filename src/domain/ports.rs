use crate::domain::account::{Account, AccountId};
use crate::domain::money::{Amount, Balance};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::Result;
use async_trait::async_trait;

/// Keyed collection of accounts; owns balances and credential hashes.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an account, assigning its id. Fails with `DuplicateUsername`
    /// if the username is taken.
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        initial_balance: Balance,
    ) -> Result<Account>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    async fn get(&self, id: AccountId) -> Result<Option<Account>>;

    /// The sole balance mutation primitive: applies `balance += delta` in
    /// minor units only if the result stays non-negative, failing with
    /// `InsufficientFunds` otherwise and leaving the balance unchanged.
    ///
    /// Callers serialize access per account (the engine's lock registry);
    /// the store only has to be linearizable per account, not lock-free.
    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Balance>;

    async fn all_accounts(&self) -> Result<Vec<Account>>;
}

/// Append-only, ordered log of monetary events.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Appends one record, assigning its id and timestamp.
    async fn append(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Transaction>;

    /// Appends the two legs of a transfer (`TransferOut` on `from`,
    /// `TransferIn` on `to`) as a single atomic unit: both records are
    /// written or neither is.
    async fn append_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(Transaction, Transaction)>;

    /// All records for one account, newest first.
    async fn history_for(&self, account_id: AccountId) -> Result<Vec<Transaction>>;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type TransactionLedgerBox = Box<dyn TransactionLedger>;
