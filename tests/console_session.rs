use bank_ledger::console::{render_transaction, Console};
use bank_ledger::credentials::Credentials;
use bank_ledger::models::{format_money, format_timestamp};
use bank_ledger::{AccountStore, Directory, InMemoryStore, Transaction};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const ALICE: &str = "111111111";
const BOB: &str = "222222222";

fn two_accounts() -> Directory {
    let mut directory = Directory::new();
    directory
        .open_account_with_id(ALICE, "Alice", None, Credentials::from_password("pw"), Some(dec!(50)))
        .unwrap();
    directory
        .open_account_with_id(BOB, "Bob", None, Credentials::from_password("bobpw"), None)
        .unwrap();
    directory
}

/// Run a scripted session and return everything written to the screen.
async fn run_script(directory: &mut Directory, store: &InMemoryStore, script: &str) -> String {
    let mut console = Console::new(script.as_bytes(), Vec::new());
    console.run(directory, store).await.unwrap();
    String::from_utf8(console.into_output()).unwrap()
}

// ============================================================================
// ACCOUNT LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_open_account_with_initial_deposit() {
    let mut directory = Directory::new();
    let store = InMemoryStore::new();

    let output = run_script(&mut directory, &store, "1\nAlice\nsecret\n1 Main St\n100\n\n3\n").await;

    assert!(output.contains("Created"));
    assert_eq!(directory.len(), 1);
    let ledger = directory.ledgers().next().unwrap();
    assert_eq!(ledger.owner_name(), "Alice");
    assert_eq!(ledger.owner_address(), Some("1 Main St"));
    assert_eq!(ledger.balance(), dec!(100));
    assert_eq!(ledger.history().len(), 1);
    assert!(ledger.credentials().verify("secret"));

    assert_eq!(store.load().await.unwrap(), directory);
}

#[tokio::test]
async fn test_open_account_with_cancelled_deposit() {
    let mut directory = Directory::new();
    let store = InMemoryStore::new();

    run_script(&mut directory, &store, "1\nBob\npw\n\ncancel\n\n3\n").await;

    let ledger = directory.ledgers().next().unwrap();
    assert_eq!(ledger.balance(), Decimal::ZERO);
    assert!(ledger.history().is_empty());
    assert_eq!(ledger.owner_address(), None);
}

#[tokio::test]
async fn test_end_of_input_at_initial_deposit_abandons_account() {
    let mut directory = Directory::new();
    let store = InMemoryStore::new();

    let output = run_script(&mut directory, &store, "1\nAlice\nsecret\n1 Main St\n").await;

    assert!(!output.contains("Created"));
    assert!(directory.is_empty());
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deposit_withdraw_transfer_session() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n1\n25\n\n2\n10\n\n3\n{BOB}\n15\ny\n\n6\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert!(output.contains("[#111111111 - Alice - $50.00]"));
    assert!(output.contains("Deposited $25.00 to [#111111111 - Alice]"));
    assert!(output.contains("Withdrew $10.00 from [#111111111 - Alice]"));
    assert!(output.contains("Transferred $15.00 [#111111111 - Alice] --> [#222222222 - Bob]"));

    assert_eq!(directory.get(ALICE).unwrap().balance(), dec!(50));
    assert_eq!(directory.get(ALICE).unwrap().history().len(), 4);
    assert_eq!(directory.get(BOB).unwrap().balance(), dec!(15));

    let saved = store.load().await.unwrap();
    assert_eq!(saved, directory);
}

#[tokio::test]
async fn test_declined_transfer_confirmation() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n3\n{BOB}\n15\nn\n6\n3\n");
    run_script(&mut directory, &store, &script).await;

    assert_eq!(directory.get(ALICE).unwrap().balance(), dec!(50));
    assert!(directory.get(BOB).unwrap().history().is_empty());
}

#[tokio::test]
async fn test_close_account_removes_ledger() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n5\ny\n\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert!(output.contains("Account #111111111 closed, $50.00 withdrawn"));
    assert!(!directory.contains(ALICE));
    assert!(!store.load().await.unwrap().contains(ALICE));
}

// ============================================================================
// REJECTED INPUT
// ============================================================================

#[tokio::test]
async fn test_wrong_password_locks_out_after_five_attempts() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\nx\nx\nx\nx\nx\n\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert_eq!(output.matches("Incorrect password").count(), 5);
    assert!(output.contains("Login failed."));
    assert!(!output.contains("[1] Deposit Funds"));
}

#[tokio::test]
async fn test_unknown_account_reprompts_until_cancel() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let output = run_script(&mut directory, &store, "2\n999999999\ncancel\n3\n").await;

    assert!(output.contains("Account not found. Please try again or type 'cancel'."));
}

#[tokio::test]
async fn test_invalid_amounts_reprompt() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n1\nabc\n-5\n0\ncancel\n6\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert_eq!(output.matches("Please enter a valid number").count(), 1);
    assert_eq!(output.matches("Amount must be greater than 0").count(), 2);
    assert_eq!(directory.get(ALICE).unwrap().history().len(), 1);
}

#[tokio::test]
async fn test_overdraft_reported() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n2\n500\n\n6\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert!(output.contains("[ERROR] insufficient funds"));
    assert_eq!(directory.get(ALICE).unwrap().balance(), dec!(50));
}

#[tokio::test]
async fn test_transfer_to_own_account_reported() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n3\n{ALICE}\n5\ny\n\n6\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert!(output.contains("[ERROR] cannot transfer to the same account"));
    assert_eq!(directory.get(ALICE).unwrap().history().len(), 1);
}

#[tokio::test]
async fn test_end_of_input_saves_and_exits() {
    let mut directory = two_accounts();
    let store = InMemoryStore::new();

    let script = format!("2\n{ALICE}\npw\n1\n");
    run_script(&mut directory, &store, &script).await;

    assert_eq!(store.load().await.unwrap(), directory);
}

// ============================================================================
// RENDERING
// ============================================================================

#[tokio::test]
async fn test_history_listing() {
    let mut directory = two_accounts();
    directory.deposit(ALICE, dec!(2000)).unwrap();
    directory.transfer(ALICE, BOB, dec!(1234.5)).unwrap();
    let store = InMemoryStore::new();

    let script = format!("2\n{BOB}\nbobpw\n4\n\n6\n3\n");
    let output = run_script(&mut directory, &store, &script).await;

    assert!(output.contains("1) ["));
    assert!(output.contains("] - Transfer Receive - ($1,234.50 from #111111111)"));
}

#[test]
fn test_render_transaction_lines() {
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap();

    let out = Transaction::TransferOut {
        amount: dec!(1234.5),
        timestamp,
        to: BOB.into(),
    };
    assert_eq!(
        render_transaction(3, &out),
        "3) [3/5/2024 9:07] - Transfer Send - ($1,234.50 to #222222222)"
    );

    let deposit = Transaction::Deposit {
        amount: dec!(20),
        timestamp,
    };
    assert_eq!(render_transaction(1, &deposit), "1) [3/5/2024 9:07] - Deposit - ($20.00)");
    assert_eq!(format_timestamp(&timestamp), "3/5/2024 9:07");
}

#[test]
fn test_format_money() {
    assert_eq!(format_money(Decimal::ZERO), "0.00");
    assert_eq!(format_money(dec!(999)), "999.00");
    assert_eq!(format_money(dec!(1000)), "1,000.00");
    assert_eq!(format_money(dec!(1234567.891)), "1,234,567.89");
    assert_eq!(format_money(dec!(0.125)), "0.12");
    assert_eq!(format_money(dec!(-1500.5)), "-1,500.50");
}
