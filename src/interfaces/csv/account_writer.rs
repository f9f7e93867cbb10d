use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// Writes the final account statement as CSV: `id,username,balance` with
/// balances in major.minor form. Credential hashes are never emitted.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: Vec<Account>) -> Result<()> {
        self.writer.write_record(["id", "username", "balance"])?;
        for account in accounts {
            self.writer.write_record([
                account.id.to_string(),
                account.username,
                account.balance.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
