use crate::domain::account::{Account, AccountId};
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{AccountStore, TransactionLedger};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Accounts {
    by_id: HashMap<AccountId, Account>,
    id_by_username: HashMap<String, AccountId>,
    next_id: u64,
}

/// A thread-safe in-memory account store.
///
/// `Clone` shares the underlying state. Suitable for tests and single-run
/// batch processing where durability is not required.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    inner: Arc<RwLock<Accounts>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        initial_balance: Balance,
    ) -> Result<Account> {
        let mut inner = self.inner.write().await;
        if inner.id_by_username.contains_key(username) {
            return Err(LedgerError::DuplicateUsername(username.to_string()));
        }
        inner.next_id += 1;
        let id = AccountId(inner.next_id);
        let account = Account {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance: initial_balance,
        };
        inner.id_by_username.insert(username.to_string(), id);
        inner.by_id.insert(id, account.clone());
        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .id_by_username
            .get(username)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.by_id.get(&id).cloned())
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Balance> {
        let mut inner = self.inner.write().await;
        let account = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        match account.balance.checked_adjust(delta) {
            Some(balance) => {
                account.balance = balance;
                Ok(balance)
            }
            None if delta < 0 => Err(LedgerError::InsufficientFunds),
            None => Err(LedgerError::validation("balance out of range")),
        }
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let inner = self.inner.read().await;
        let mut accounts: Vec<Account> = inner.by_id.values().cloned().collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }
}

#[derive(Default)]
struct LedgerInner {
    // Append order equals id order; history reads iterate in reverse.
    entries: Vec<Transaction>,
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl LedgerInner {
    fn next_record(
        &mut self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Transaction {
        self.next_id += 1;
        let now = Utc::now();
        // Wall clocks can step backwards; appended timestamps may not.
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        Transaction {
            id: self.next_id,
            account_id,
            kind,
            amount,
            timestamp,
        }
    }
}

/// A thread-safe in-memory append-only transaction log.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn append(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Transaction> {
        let mut inner = self.inner.write().await;
        let tx = inner.next_record(account_id, kind, amount);
        inner.entries.push(tx.clone());
        Ok(tx)
    }

    async fn append_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(Transaction, Transaction)> {
        // Both legs land under one write guard, so no reader can observe one
        // without the other.
        let mut inner = self.inner.write().await;
        let out = inner.next_record(from, TransactionKind::TransferOut, amount);
        let inn = inner.next_record(to, TransactionKind::TransferIn, amount);
        inner.entries.push(out.clone());
        inner.entries.push(inn.clone());
        Ok((out, inn))
    }

    async fn history_for(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .rev()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect())
    }
}
