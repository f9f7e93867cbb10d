use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

#[test]
fn test_batch_run_produces_final_statement() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, username, password, recipient, amount").unwrap();
    writeln!(file, "register, alice, hunter2, , 100.00").unwrap();
    writeln!(file, "deposit, alice, , , 50.00").unwrap();
    writeln!(file, "withdraw, alice, , , 25.00").unwrap();
    writeln!(file, "register, bob, secret, , 100.00").unwrap();
    writeln!(file, "transfer, alice, , bob, 10.00").unwrap();

    let mut cmd = Command::new(cargo_bin!("coffer"));
    cmd.arg(file.path());

    // alice: 100 + 50 - 25 - 10 = 115; bob: 100 + 10 = 110.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,alice,115.00"))
        .stdout(predicate::str::contains("2,bob,110.00"));
}

#[test]
fn test_insufficient_funds_row_is_reported_and_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, username, password, recipient, amount").unwrap();
    writeln!(file, "register, alice, hunter2, , 100.00").unwrap();
    writeln!(file, "withdraw, alice, , , 150.00").unwrap();

    let mut cmd = Command::new(cargo_bin!("coffer"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error processing operation"))
        .stdout(predicate::str::contains("1,alice,100.00"));
}

#[test]
fn test_malformed_row_does_not_abort_the_run() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, username, password, recipient, amount").unwrap();
    writeln!(file, "register, alice, hunter2, , 10.00").unwrap();
    writeln!(file, "explode, alice, , , 1.00").unwrap();
    writeln!(file, "deposit, alice, , , 5.00").unwrap();

    let mut cmd = Command::new(cargo_bin!("coffer"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading operation"))
        .stdout(predicate::str::contains("1,alice,15.00"));
}

#[test]
fn test_transfer_to_unknown_recipient_is_reported() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, username, password, recipient, amount").unwrap();
    writeln!(file, "register, alice, hunter2, , 100.00").unwrap();
    writeln!(file, "transfer, alice, , ghost, 10.00").unwrap();

    let mut cmd = Command::new(cargo_bin!("coffer"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("account not found"))
        .stdout(predicate::str::contains("1,alice,100.00"));
}
