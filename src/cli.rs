use crate::config::Config;
use crate::console::Console;
use crate::credentials::Credentials;
use crate::csv_io::{stream_operations, write_accounts, write_statement};
use crate::directory::Directory;
use crate::errors::LedgerError;
use crate::models::{AccountOutput, OperationRow, OperationType};
use crate::storage::{AccountStore, JsonFileStore};
use anyhow::{anyhow, Result};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::BufReader;

/// Menu-driven session on stdin/stdout against the configured accounts file.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let store = JsonFileStore::new(config.data_path.clone());
    let mut directory = store.load().await?;

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .with_clear_screen(config.clear_screen);
    console.run(&mut directory, &store).await
}

/// Apply every row of `input_path` in order, save once, and print a summary.
pub async fn run_batch(config: &Config, input_path: PathBuf) -> Result<()> {
    let store = JsonFileStore::new(config.data_path.clone());
    let mut directory = store.load().await?;

    let file = File::open(&input_path).await?;
    let reader = BufReader::new(file);
    let mut stream = stream_operations(reader);

    let mut line = 1usize;
    while let Some(result) = stream.next().await {
        line += 1;
        match result {
            Ok(row) => {
                if let Err(e) = apply_operation(&mut directory, &row) {
                    tracing::warn!(line, error = %e, "Skipped batch row");
                }
            }
            Err(e) => {
                tracing::warn!(line, error = %e, "Unreadable batch row");
            }
        }
    }

    store.save(&directory).await?;

    // BTreeMap order keeps the summary sorted by account
    let accounts: Vec<AccountOutput> = directory.ledgers().map(AccountOutput::from).collect();
    write_accounts(tokio::io::stdout(), accounts).await?;

    Ok(())
}

/// Print the full history of one account as CSV.
pub async fn run_statement(config: &Config, account: &str) -> Result<()> {
    let store = JsonFileStore::new(config.data_path.clone());
    let directory = store.load().await?;

    let ledger = directory
        .get(account)
        .ok_or_else(|| LedgerError::AccountNotFound(account.to_string()))?;
    write_statement(tokio::io::stdout(), ledger).await
}

/// Execute one batch row against the directory.
pub fn apply_operation(directory: &mut Directory, row: &OperationRow) -> Result<()> {
    match row.op_type {
        OperationType::Open => {
            let name = row
                .name
                .as_deref()
                .ok_or_else(|| anyhow!("open requires a name"))?;
            let password = row
                .password
                .as_deref()
                .ok_or_else(|| anyhow!("open requires a password"))?;
            let initial_deposit = row.amount()?;
            let credentials = Credentials::from_password(password);
            directory.open_account_with_id(&row.account, name, None, credentials, initial_deposit)?;
        }
        OperationType::Deposit => {
            let amount = row.required_amount()?;
            directory.deposit(&row.account, amount)?;
        }
        OperationType::Withdrawal => {
            let amount = row.required_amount()?;
            directory.withdraw(&row.account, amount)?;
        }
        OperationType::Transfer => {
            let amount = row.required_amount()?;
            let target = row
                .counterparty
                .as_deref()
                .ok_or_else(|| anyhow!("transfer requires a counterparty"))?;
            directory.transfer(&row.account, target, amount)?;
        }
        OperationType::Close => {
            directory.close_account(&row.account)?;
        }
    }

    Ok(())
}
