use crate::application::auth::AuthService;
use crate::application::locks::AccountLocks;
use crate::domain::account::{Account, AccountId};
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{AccountStoreBox, TransactionLedgerBox};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use std::time::Duration;

/// The money-movement engine.
///
/// Orchestrates deposits, withdrawals, and transfers as atomic operations
/// spanning the account store and the transaction ledger. Each operation
/// takes the exclusive lock of every account it mutates; transfers take both
/// locks in ascending id order. When a later sub-step fails, completed
/// sub-steps are undone in reverse order before the error is surfaced, so
/// balances and ledger never disagree.
///
/// All methods take `&self`; the engine is safe to share across tasks.
pub struct TransferEngine {
    accounts: AccountStoreBox,
    ledger: TransactionLedgerBox,
    auth: AuthService,
    locks: AccountLocks,
}

impl TransferEngine {
    pub fn new(accounts: AccountStoreBox, ledger: TransactionLedgerBox) -> Self {
        Self {
            accounts,
            ledger,
            auth: AuthService::new(),
            locks: AccountLocks::default(),
        }
    }

    /// Like [`TransferEngine::new`] with a custom bound on how long an
    /// operation may wait for account locks before failing `Busy`.
    pub fn with_lock_wait(
        accounts: AccountStoreBox,
        ledger: TransactionLedgerBox,
        wait: Duration,
    ) -> Self {
        Self {
            accounts,
            ledger,
            auth: AuthService::new(),
            locks: AccountLocks::new(wait),
        }
    }

    /// Registers a new account with an initial balance.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        initial_balance: Balance,
    ) -> Result<Account> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LedgerError::validation("username must not be empty"));
        }
        if password.is_empty() {
            return Err(LedgerError::validation("password must not be empty"));
        }
        let password_hash = self.auth.hash(password)?;
        let account = self
            .accounts
            .create(username, &password_hash, initial_balance)
            .await?;
        tracing::debug!(username, account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Verifies credentials and returns the account.
    ///
    /// Unknown usernames fail `AccountNotFound`; a wrong password fails
    /// `AuthFailed`.
    pub async fn login(&self, username: &str, password: &str) -> Result<Account> {
        let account = self.resolve(username).await?;
        if self.auth.verify(password, &account.password_hash) {
            Ok(account)
        } else {
            Err(LedgerError::AuthFailed)
        }
    }

    pub async fn deposit(&self, username: &str, amount: Amount) -> Result<Transaction> {
        let account = self.resolve(username).await?;
        let _guard = self.locks.acquire(account.id).await?;

        self.accounts
            .adjust_balance(account.id, amount.minor())
            .await?;
        match self
            .ledger
            .append(account.id, TransactionKind::Deposit, amount)
            .await
        {
            Ok(tx) => {
                tracing::debug!(account_id = %account.id, %amount, "deposit committed");
                Ok(tx)
            }
            Err(err) => {
                tracing::warn!(account_id = %account.id, %err, "ledger append failed, reversing deposit");
                self.reverse(account.id, -amount.minor()).await?;
                Err(err)
            }
        }
    }

    pub async fn withdraw(&self, username: &str, amount: Amount) -> Result<Transaction> {
        let account = self.resolve(username).await?;
        let _guard = self.locks.acquire(account.id).await?;

        self.accounts
            .adjust_balance(account.id, -amount.minor())
            .await?;
        match self
            .ledger
            .append(account.id, TransactionKind::Withdraw, amount)
            .await
        {
            Ok(tx) => {
                tracing::debug!(account_id = %account.id, %amount, "withdrawal committed");
                Ok(tx)
            }
            Err(err) => {
                tracing::warn!(account_id = %account.id, %err, "ledger append failed, reversing withdrawal");
                self.reverse(account.id, amount.minor()).await?;
                Err(err)
            }
        }
    }

    /// Moves `amount` from `sender` to `recipient` atomically.
    ///
    /// The transfer is observable exactly when both balance changes and both
    /// ledger entries exist, or none of the four do.
    pub async fn transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: Amount,
    ) -> Result<(Transaction, Transaction)> {
        let from = self.resolve(sender).await?;
        let to = self.resolve(recipient).await?;
        if from.id == to.id {
            return Err(LedgerError::validation(
                "sender and recipient must be different accounts",
            ));
        }

        let _guards = self.locks.acquire_pair(from.id, to.id).await?;

        self.accounts
            .adjust_balance(from.id, -amount.minor())
            .await?;

        if let Err(err) = self.accounts.adjust_balance(to.id, amount.minor()).await {
            tracing::warn!(sender = %from.id, recipient = %to.id, %err, "credit failed, reversing debit");
            self.reverse(from.id, amount.minor()).await?;
            return Err(err);
        }

        match self.ledger.append_transfer(from.id, to.id, amount).await {
            Ok(pair) => {
                tracing::debug!(sender = %from.id, recipient = %to.id, %amount, "transfer committed");
                Ok(pair)
            }
            Err(err) => {
                tracing::warn!(sender = %from.id, recipient = %to.id, %err, "ledger append failed, reversing transfer");
                self.reverse(to.id, -amount.minor()).await?;
                self.reverse(from.id, amount.minor()).await?;
                Err(err)
            }
        }
    }

    /// The account's transaction history, newest first.
    pub async fn history(&self, username: &str) -> Result<Vec<Transaction>> {
        let account = self.resolve(username).await?;
        self.ledger.history_for(account.id).await
    }

    /// Snapshot of every account, for reporting.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.accounts.all_accounts().await
    }

    async fn resolve(&self, username: &str) -> Result<Account> {
        let username = username.trim();
        self.accounts
            .find_by_username(username)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(username.to_string()))
    }

    // Compensating adjustment after a failed sub-step. A failure here means
    // the store and ledger may disagree; it is logged and surfaced, never
    // swallowed.
    async fn reverse(&self, id: AccountId, delta: i64) -> Result<()> {
        if let Err(err) = self.accounts.adjust_balance(id, delta).await {
            tracing::error!(account_id = %id, delta, %err, "balance rollback failed");
            return Err(err);
        }
        Ok(())
    }
}
