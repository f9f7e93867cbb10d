use crate::domain::account::AccountId;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Exclusive access held on one account for the duration of an operation.
pub type AccountGuard = OwnedMutexGuard<()>;

/// Registry of per-account locks.
///
/// Every operation that reads-then-writes a balance takes the account's lock
/// first; transfers take both locks in ascending id order, which is the sole
/// deadlock-avoidance mechanism. Acquisition is bounded: a caller that cannot
/// get the lock within `wait` fails with `Busy` instead of blocking, and no
/// mutation has happened at that point.
pub struct AccountLocks {
    handles: StdMutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    wait: Duration,
}

impl AccountLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            handles: StdMutex::new(HashMap::new()),
            wait,
        }
    }

    // The registry mutex is never held across an await; we only clone the
    // handle out of it.
    fn handle(&self, id: AccountId) -> Arc<Mutex<()>> {
        let mut handles = self.handles.lock().expect("account lock registry poisoned");
        handles.entry(id).or_default().clone()
    }

    pub async fn acquire(&self, id: AccountId) -> Result<AccountGuard> {
        let handle = self.handle(id);
        tokio::time::timeout(self.wait, handle.lock_owned())
            .await
            .map_err(|_| LedgerError::Busy)
    }

    /// Acquires two account locks in ascending id order, regardless of
    /// argument order.
    pub async fn acquire_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> Result<(AccountGuard, AccountGuard)> {
        debug_assert_ne!(a, b, "pair acquisition requires distinct accounts");
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await?;
        let second_guard = self.acquire(second).await?;
        Ok((first_guard, second_guard))
    }
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}
