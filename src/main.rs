use clap::Parser;
use coffer::application::engine::TransferEngine;
use coffer::domain::money::{Amount, Balance};
use coffer::error::{LedgerError, Result};
use coffer::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedger};
#[cfg(feature = "storage-rocksdb")]
use coffer::infrastructure::rocksdb::RocksDBStore;
use coffer::interfaces::csv::account_writer::AccountWriter;
use coffer::interfaces::csv::operation_reader::{OperationKind, OperationReader, OperationRecord};
use miette::IntoDiagnostic;
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let engine = build_engine(&cli)?;

    // Process operations; per-row failures are reported and the run continues.
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for record in reader.operations() {
        match record {
            Ok(record) => {
                if let Err(e) = apply_operation(&engine, record).await {
                    eprintln!("Error processing operation: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {e}");
            }
        }
    }

    // Output the final account statement.
    let accounts = engine.accounts().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}

fn build_engine(cli: &Cli) -> miette::Result<TransferEngine> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok(TransferEngine::new(
            Box::new(store.clone()),
            Box::new(store),
        ));
    }
    #[cfg(not(feature = "storage-rocksdb"))]
    let _ = cli;
    Ok(TransferEngine::new(
        Box::new(InMemoryAccountStore::new()),
        Box::new(InMemoryLedger::new()),
    ))
}

async fn apply_operation(engine: &TransferEngine, record: OperationRecord) -> Result<()> {
    match record.op {
        OperationKind::Register => {
            let password = record
                .password
                .ok_or_else(|| LedgerError::validation("register requires a password"))?;
            let balance = match record.amount {
                Some(value) => Balance::from_decimal(value)?,
                None => Balance::ZERO,
            };
            engine.register(&record.username, &password, balance).await?;
        }
        OperationKind::Deposit => {
            let amount = require_amount(record.amount)?;
            engine.deposit(&record.username, amount).await?;
        }
        OperationKind::Withdraw => {
            let amount = require_amount(record.amount)?;
            engine.withdraw(&record.username, amount).await?;
        }
        OperationKind::Transfer => {
            let recipient = record
                .recipient
                .ok_or_else(|| LedgerError::validation("transfer requires a recipient"))?;
            let amount = require_amount(record.amount)?;
            engine
                .transfer(&record.username, &recipient, amount)
                .await?;
        }
    }
    Ok(())
}

fn require_amount(amount: Option<Decimal>) -> Result<Amount> {
    let value = amount.ok_or_else(|| LedgerError::validation("operation requires an amount"))?;
    Amount::from_decimal(value)
}
