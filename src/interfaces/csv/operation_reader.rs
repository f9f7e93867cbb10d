use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Register,
    Deposit,
    Withdraw,
    Transfer,
}

/// One row of a batch operations file.
///
/// `password` is only meaningful for `register`, `recipient` only for
/// `transfer`; empty fields deserialize to `None`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRecord {
    pub op: OperationKind,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<OperationRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_parses_operations() {
        let data = "op, username, password, recipient, amount\n\
                    register, alice, hunter2, , 100.00\n\
                    deposit, alice, , , 50.00\n\
                    transfer, alice, , bob, 10.00";
        let records: Vec<_> = OperationReader::new(data.as_bytes())
            .operations()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].op, OperationKind::Register);
        assert_eq!(records[0].password.as_deref(), Some("hunter2"));
        assert_eq!(records[0].recipient, None);
        assert_eq!(records[0].amount, Some(dec!(100.00)));

        assert_eq!(records[1].op, OperationKind::Deposit);
        assert_eq!(records[1].password, None);

        assert_eq!(records[2].op, OperationKind::Transfer);
        assert_eq!(records[2].recipient.as_deref(), Some("bob"));
    }

    #[test]
    fn test_reader_flags_malformed_rows() {
        let data = "op, username, password, recipient, amount\n\
                    explode, alice, , , 1.00\n\
                    deposit, alice, , , 5.00";
        let results: Vec<_> = OperationReader::new(data.as_bytes()).operations().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }
}
