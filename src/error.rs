use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy for ledger operations.
///
/// Business-rule failures (`Validation`, `DuplicateUsername`, `AccountNotFound`,
/// `AuthFailed`, `InsufficientFunds`, `Busy`) are expected outcomes returned to
/// the caller. `Storage` wraps underlying persistence failures; the engine rolls
/// back any completed sub-step before surfacing one.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("username already registered: {0}")]
    DuplicateUsername(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("invalid credentials")]
    AuthFailed,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("account locked by another operation, wait timed out")]
    Busy,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err)
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        Self::storage(err)
    }
}
