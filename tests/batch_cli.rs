use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{NamedTempFile, TempDir};

const HEADER: &str = "type,account,amount,counterparty,name,password\n";

fn batch(data_dir: &TempDir, rows: &str) -> String {
    let input = NamedTempFile::new().unwrap();
    fs::write(input.path(), format!("{HEADER}{rows}")).unwrap();

    let mut cmd = Command::cargo_bin("bank-ledger").unwrap();
    let output = cmd
        .arg("--data")
        .arg(data_dir.path().join("accounts.json"))
        .arg("batch")
        .arg(input.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    String::from_utf8(output).unwrap()
}

// ============================================================================
// BATCH MODE TESTS
// ============================================================================

#[test]
fn test_batch_scenario() {
    let data_dir = TempDir::new().unwrap();
    let output = batch(
        &data_dir,
        "open,100000001,100.00,,Alice,pw\n\
         open,100000002,,,Bob,pw\n\
         withdrawal,100000001,40.00\n\
         transfer,100000001,60.00,100000002\n\
         withdrawal,100000001,0.01\n",
    );

    assert!(output.starts_with("account,balance,transactions\n"));
    // Last withdrawal is rejected for insufficient funds
    assert!(output.contains("100000001,0.00,3\n"));
    assert!(output.contains("100000002,60.00,1\n"));
}

#[test]
fn test_batch_skips_invalid_rows() {
    let data_dir = TempDir::new().unwrap();
    let output = batch(
        &data_dir,
        "open,100000001,10,,Alice,pw\n\
         deposit,100000001,-5\n\
         deposit,100000001,abc\n\
         deposit,100000001\n\
         deposit,999999999,5\n\
         transfer,100000001,5,100000001\n\
         bogus,100000001,5\n\
         open,100000001,,,Again,pw\n\
         open,100000003,,,NoPassword\n",
    );

    assert!(output.contains("100000001,10.00,1\n"));
    assert!(!output.contains("100000003"));
    assert!(!output.contains("999999999"));
}

#[test]
fn test_batch_persists_between_runs() {
    let data_dir = TempDir::new().unwrap();
    batch(&data_dir, "open,100000001,25.50,,Alice,pw\n");
    let output = batch(&data_dir, "deposit,100000001,4.50\n");

    assert!(output.contains("100000001,30.00,2\n"));
}

#[test]
fn test_batch_close_removes_account() {
    let data_dir = TempDir::new().unwrap();
    let output = batch(
        &data_dir,
        "open,100000001,25,,Alice,pw\n\
         open,100000002,1,,Bob,pw\n\
         close,100000001\n",
    );

    assert!(!output.contains("100000001"));
    assert!(output.contains("100000002,1.00,1\n"));
}

#[test]
fn test_batch_missing_input_file() {
    let data_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("bank-ledger").unwrap();
    cmd.arg("--data")
        .arg(data_dir.path().join("accounts.json"))
        .arg("batch")
        .arg("nonexistent.csv")
        .assert()
        .failure();
}

// ============================================================================
// STATEMENT TESTS
// ============================================================================

#[test]
fn test_statement_lists_history() {
    let data_dir = TempDir::new().unwrap();
    batch(
        &data_dir,
        "open,100000001,100.00,,Alice,pw\n\
         open,100000002,,,Bob,pw\n\
         transfer,100000001,60.00,100000002\n",
    );

    let mut cmd = Command::cargo_bin("bank-ledger").unwrap();
    cmd.arg("--data")
        .arg(data_dir.path().join("accounts.json"))
        .arg("statement")
        .arg("100000001")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("n,date,type,amount,counterparty\n"))
        .stdout(predicate::str::contains(",deposit,100.00,\n"))
        .stdout(predicate::str::contains(",transferSend,60.00,100000002\n"));
}

#[test]
fn test_statement_unknown_account_fails() {
    let data_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("bank-ledger").unwrap();
    cmd.arg("--data")
        .arg(data_dir.path().join("accounts.json"))
        .arg("statement")
        .arg("123456789")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
