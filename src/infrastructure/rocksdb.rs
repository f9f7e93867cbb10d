use crate::domain::account::{Account, AccountId};
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{AccountStore, TransactionLedger};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column family for account records, keyed by big-endian account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family mapping usernames to account ids (the unique index).
pub const CF_USERNAMES: &str = "usernames";
/// Column family for ledger records, keyed by big-endian transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";

struct Inner {
    db: DB,
    // Last ids in use; allocation is fetch_add + 1.
    account_id: AtomicU64,
    transaction_id: AtomicU64,
    last_timestamp_micros: AtomicI64,
    // Serializes create(): the username uniqueness check and the insert are
    // two RocksDB operations.
    create_guard: Mutex<()>,
}

/// A durable store backing both ports with RocksDB.
///
/// Values are JSON-encoded records; the key layout mirrors the relational
/// shape of an accounts table plus a transactions table with a username
/// index. `Clone` shares the underlying database handle, so one instance can
/// be boxed as both the account store and the ledger.
#[derive(Clone)]
pub struct RocksDBStore {
    inner: Arc<Inner>,
}

impl RocksDBStore {
    /// Opens or creates the database at `path`, rebuilding id counters from
    /// the last key of each column family.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_USERNAMES, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        let account_id = last_key(&db, CF_ACCOUNTS)?;
        let transaction_id = last_key(&db, CF_TRANSACTIONS)?;

        Ok(Self {
            inner: Arc::new(Inner {
                db,
                account_id: AtomicU64::new(account_id),
                transaction_id: AtomicU64::new(transaction_id),
                last_timestamp_micros: AtomicI64::new(0),
                create_guard: Mutex::new(()),
            }),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.inner.db.cf_handle(name).ok_or_else(|| {
            LedgerError::storage(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }

    fn load_account(&self, id: AccountId) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.inner.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let value = serde_json::to_vec(account)?;
        self.inner.db.put_cf(cf, account.id.0.to_be_bytes(), value)?;
        Ok(())
    }

    fn next_transaction(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Transaction {
        let id = self.inner.transaction_id.fetch_add(1, Ordering::SeqCst) + 1;
        Transaction {
            id,
            account_id,
            kind,
            amount,
            timestamp: self.next_timestamp(),
        }
    }

    // Non-decreasing even when the wall clock steps backwards.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let now_micros = now.timestamp_micros();
        let previous = self
            .inner
            .last_timestamp_micros
            .fetch_max(now_micros, Ordering::SeqCst);
        if previous <= now_micros {
            now
        } else {
            DateTime::from_timestamp_micros(previous).unwrap_or(now)
        }
    }
}

fn last_key(db: &DB, cf_name: &str) -> Result<u64> {
    let cf = db.cf_handle(cf_name).ok_or_else(|| {
        LedgerError::storage(std::io::Error::other(format!(
            "column family {cf_name} not found"
        )))
    })?;
    let mut iter = db.iterator_cf(cf, IteratorMode::End);
    match iter.next() {
        Some(item) => {
            let (key, _value) = item?;
            let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                LedgerError::storage(std::io::Error::other(format!(
                    "malformed key in column family {cf_name}"
                )))
            })?;
            Ok(u64::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        initial_balance: Balance,
    ) -> Result<Account> {
        let _guard = self.inner.create_guard.lock().await;

        let usernames = self.cf(CF_USERNAMES)?;
        if self.inner.db.get_cf(usernames, username.as_bytes())?.is_some() {
            return Err(LedgerError::DuplicateUsername(username.to_string()));
        }

        let id = AccountId(self.inner.account_id.fetch_add(1, Ordering::SeqCst) + 1);
        let account = Account {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            balance: initial_balance,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(usernames, username.as_bytes(), id.0.to_be_bytes());
        batch.put_cf(
            self.cf(CF_ACCOUNTS)?,
            id.0.to_be_bytes(),
            serde_json::to_vec(&account)?,
        );
        self.inner.db.write(batch)?;

        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let usernames = self.cf(CF_USERNAMES)?;
        let Some(id_bytes) = self.inner.db.get_cf(usernames, username.as_bytes())? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = id_bytes.as_slice().try_into().map_err(|_| {
            LedgerError::storage(std::io::Error::other("malformed username index entry"))
        })?;
        self.load_account(AccountId(u64::from_be_bytes(bytes)))
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.load_account(id)
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Balance> {
        // Read-modify-write; the engine's per-account lock serializes callers.
        let mut account = self
            .load_account(id)?
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        match account.balance.checked_adjust(delta) {
            Some(balance) => {
                account.balance = balance;
                self.put_account(&account)?;
                Ok(balance)
            }
            None if delta < 0 => Err(LedgerError::InsufficientFunds),
            None => Err(LedgerError::validation("balance out of range")),
        }
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.inner.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }
}

#[async_trait]
impl TransactionLedger for RocksDBStore {
    async fn append(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Transaction> {
        let tx = self.next_transaction(account_id, kind, amount);
        let cf = self.cf(CF_TRANSACTIONS)?;
        self.inner
            .db
            .put_cf(cf, tx.id.to_be_bytes(), serde_json::to_vec(&tx)?)?;
        Ok(tx)
    }

    async fn append_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(Transaction, Transaction)> {
        let out = self.next_transaction(from, TransactionKind::TransferOut, amount);
        let inn = self.next_transaction(to, TransactionKind::TransferIn, amount);

        // One batch: both legs land or neither does.
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(cf, out.id.to_be_bytes(), serde_json::to_vec(&out)?);
        batch.put_cf(cf, inn.id.to_be_bytes(), serde_json::to_vec(&inn)?);
        self.inner.db.write(batch)?;

        Ok((out, inn))
    }

    async fn history_for(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut history = Vec::new();
        // Keys are big-endian ids, so reverse iteration is newest first.
        for item in self.inner.db.iterator_cf(cf, IteratorMode::End) {
            let (_key, value) = item?;
            let tx: Transaction = serde_json::from_slice(&value)?;
            if tx.account_id == account_id {
                history.push(tx);
            }
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn amount(minor: i64) -> Amount {
        Amount::new(minor).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        assert!(store.inner.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.inner.db.cf_handle(CF_USERNAMES).is_some());
        assert!(store.inner.db.cf_handle(CF_TRANSACTIONS).is_some());
    }

    #[tokio::test]
    async fn test_account_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let account = store
            .create("alice", "hash", Balance::new(100).unwrap())
            .await
            .unwrap();
        assert_eq!(account.id, AccountId(1));

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, account);
        assert!(store.find_by_username("bob").await.unwrap().is_none());

        let duplicate = store.create("alice", "other", Balance::ZERO).await;
        assert!(matches!(duplicate, Err(LedgerError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_adjust_balance_persists() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let account = store
            .create("alice", "hash", Balance::new(100).unwrap())
            .await
            .unwrap();

        store.adjust_balance(account.id, -40).await.unwrap();
        let reread = store.get(account.id).await.unwrap().unwrap();
        assert_eq!(reread.balance.minor(), 60);

        let result = store.adjust_balance(account.id, -100).await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));
        assert_eq!(
            store.get(account.id).await.unwrap().unwrap().balance.minor(),
            60
        );
    }

    #[tokio::test]
    async fn test_transfer_append_is_batched() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let (out, inn) = store
            .append_transfer(AccountId(1), AccountId(2), amount(500))
            .await
            .unwrap();
        assert_eq!(out.kind, TransactionKind::TransferOut);
        assert_eq!(inn.kind, TransactionKind::TransferIn);

        let sender_history = store.history_for(AccountId(1)).await.unwrap();
        let recipient_history = store.history_for(AccountId(2)).await.unwrap();
        assert_eq!(sender_history.len(), 1);
        assert_eq!(recipient_history.len(), 1);
        assert_eq!(sender_history[0].amount, recipient_history[0].amount);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        for i in 1..=3 {
            store
                .append(AccountId(1), TransactionKind::Deposit, amount(i * 100))
                .await
                .unwrap();
        }
        let history = store.history_for(AccountId(1)).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[0].id > history[1].id);
        assert!(history[1].id > history[2].id);
    }
}
