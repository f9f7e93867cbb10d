use crate::domain::money::Balance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier, assigned by the store at creation.
///
/// The total order on ids is what transfers use to acquire their two account
/// locks deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger account.
///
/// `username` is the unique external key; `password_hash` holds the PHC-format
/// argon2id digest set at registration. The balance is only ever mutated
/// through `AccountStore::adjust_balance` and never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub password_hash: String,
    pub balance: Balance,
}
