//! Interactive menu session.
//!
//! The console owns no state of its own: it collects validated input, calls
//! into the [`Directory`] and asks the [`AccountStore`] to persist after every
//! committed mutation. End of input is treated as "cancel" at a prompt and
//! as "quit" at a menu, so a closed stdin always ends the session cleanly.

use crate::credentials::Credentials;
use crate::directory::Directory;
use crate::errors::LedgerError;
use crate::models::{format_money, format_timestamp, parse_amount, Transaction};
use crate::storage::AccountStore;
use anyhow::Result;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const MAX_LOGIN_ATTEMPTS: usize = 5;
const CANCEL: &str = "cancel";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Console<R, W> {
    input: R,
    output: W,
    clear_screen: bool,
    input_closed: bool,
}

enum Flow {
    Continue,
    Leave,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            clear_screen: false,
            input_closed: false,
        }
    }

    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the main menu until the user quits or input ends, then save.
    pub async fn run(&mut self, directory: &mut Directory, store: &dyn AccountStore) -> Result<()> {
        loop {
            self.clear().await?;
            let Some(choice) = self
                .prompt("[1] Open Account\n[2] Enter Account\n[3] Quit\n> ")
                .await?
            else {
                break;
            };

            match choice.as_str() {
                "1" => self.open_account(directory, store).await?,
                "2" => self.enter_account(directory, store).await?,
                "3" => break,
                _ => {}
            }
        }

        store.save(directory).await?;
        tracing::info!(accounts = directory.len(), "Session ended");
        Ok(())
    }

    async fn open_account(&mut self, directory: &mut Directory, store: &dyn AccountStore) -> Result<()> {
        let Some(name) = self.prompt("Enter Account Holder Name: ").await? else {
            return Ok(());
        };
        let Some(password) = self.prompt("Create Account Password: ").await? else {
            return Ok(());
        };
        let Some(address) = self.prompt("Enter Account Holder Address: ").await? else {
            return Ok(());
        };
        let deposit = self
            .prompt_amount("Enter Initial Deposit Amount or type 'cancel': $")
            .await?;
        // Typing 'cancel' skips the deposit; losing input abandons the account
        if self.input_closed {
            return Ok(());
        }

        let address = Some(address).filter(|a| !a.is_empty());
        let credentials = Credentials::from_password(&password);

        match directory.open_account(&name, address, credentials, deposit) {
            Ok(identifier) => {
                store.save(directory).await?;
                self.say(&format!("Account #{identifier} Created")).await?;
            }
            Err(e) => self.report(&e).await?,
        }
        self.pause().await
    }

    async fn enter_account(&mut self, directory: &mut Directory, store: &dyn AccountStore) -> Result<()> {
        let Some(identifier) = self
            .prompt_account(directory, "Enter Account Number or type 'cancel': #")
            .await?
        else {
            return Ok(());
        };

        if !self.authenticate(directory, &identifier).await? {
            self.say("Login failed.").await?;
            return self.pause().await;
        }

        loop {
            let Some(ledger) = directory.get(&identifier) else {
                return Ok(());
            };
            let header = format!(
                "[#{} - {} - ${}]",
                identifier,
                ledger.owner_name(),
                format_money(ledger.balance())
            );

            self.clear().await?;
            self.say(&header).await?;
            let Some(choice) = self
                .prompt("[1] Deposit Funds\n[2] Withdraw Funds\n[3] Transfer Funds\n[4] View Transactions\n[5] Close Account\n[6] Exit Account\n> ")
                .await?
            else {
                return Ok(());
            };

            let flow = match choice.as_str() {
                "1" => self.deposit(directory, store, &identifier).await?,
                "2" => self.withdraw(directory, store, &identifier).await?,
                "3" => self.transfer(directory, store, &identifier).await?,
                "4" => self.show_history(directory, &identifier).await?,
                "5" => self.close_account(directory, store, &identifier).await?,
                "6" => Flow::Leave,
                _ => Flow::Continue,
            };

            if let Flow::Leave = flow {
                return Ok(());
            }
        }
    }

    async fn authenticate(&mut self, directory: &Directory, identifier: &str) -> Result<bool> {
        let Some(ledger) = directory.get(identifier) else {
            return Ok(false);
        };

        for _ in 0..MAX_LOGIN_ATTEMPTS {
            let Some(password) = self.prompt("Enter Account Password: ").await? else {
                return Ok(false);
            };
            if ledger.credentials().verify(&password) {
                return Ok(true);
            }
            self.say("Incorrect password").await?;
        }

        tracing::warn!(account = identifier, "Too many failed login attempts");
        Ok(false)
    }

    async fn deposit(
        &mut self,
        directory: &mut Directory,
        store: &dyn AccountStore,
        identifier: &str,
    ) -> Result<Flow> {
        let Some(amount) = self.prompt_amount("Enter Deposit Amount: $").await? else {
            return Ok(Flow::Continue);
        };

        match directory.deposit(identifier, amount) {
            Ok(_) => {
                store.save(directory).await?;
                let line = format!("Deposited ${} to {}", format_money(amount), label(directory, identifier));
                self.say(&line).await?;
            }
            Err(e) => self.report(&e).await?,
        }
        self.pause().await?;
        Ok(Flow::Continue)
    }

    async fn withdraw(
        &mut self,
        directory: &mut Directory,
        store: &dyn AccountStore,
        identifier: &str,
    ) -> Result<Flow> {
        let Some(amount) = self.prompt_amount("Enter Withdrawal Amount: $").await? else {
            return Ok(Flow::Continue);
        };

        match directory.withdraw(identifier, amount) {
            Ok(_) => {
                store.save(directory).await?;
                let line = format!("Withdrew ${} from {}", format_money(amount), label(directory, identifier));
                self.say(&line).await?;
            }
            Err(e) => self.report(&e).await?,
        }
        self.pause().await?;
        Ok(Flow::Continue)
    }

    async fn transfer(
        &mut self,
        directory: &mut Directory,
        store: &dyn AccountStore,
        identifier: &str,
    ) -> Result<Flow> {
        let Some(target) = self
            .prompt_account(directory, "Enter Account Number of Transferee or type 'cancel': #")
            .await?
        else {
            return Ok(Flow::Continue);
        };

        let prompt = format!("Enter amount to transfer to {}: $", label(directory, &target));
        let Some(amount) = self.prompt_amount(&prompt).await? else {
            return Ok(Flow::Continue);
        };

        let route = format!(
            "${} {} --> {}",
            format_money(amount),
            label(directory, identifier),
            label(directory, &target)
        );
        if !self.confirm(&format!("Are you sure you want to transfer {route} (Y/N)? ")).await? {
            return Ok(Flow::Continue);
        }

        match directory.transfer(identifier, &target, amount) {
            Ok(()) => {
                store.save(directory).await?;
                self.say(&format!("Transferred {route}")).await?;
            }
            Err(e) => self.report(&e).await?,
        }
        self.pause().await?;
        Ok(Flow::Continue)
    }

    async fn show_history(&mut self, directory: &Directory, identifier: &str) -> Result<Flow> {
        let lines: Vec<String> = match directory.get(identifier) {
            Some(ledger) => ledger
                .history()
                .iter()
                .enumerate()
                .map(|(i, tx)| render_transaction(i + 1, tx))
                .collect(),
            None => Vec::new(),
        };

        self.clear().await?;
        if lines.is_empty() {
            self.say("No transactions recorded").await?;
        }
        for line in &lines {
            self.say(line).await?;
        }
        self.pause().await?;
        Ok(Flow::Continue)
    }

    async fn close_account(
        &mut self,
        directory: &mut Directory,
        store: &dyn AccountStore,
        identifier: &str,
    ) -> Result<Flow> {
        if !self
            .confirm("Are you sure you want to close your account (Y/N)? ")
            .await?
        {
            return Ok(Flow::Continue);
        }

        let account_label = label(directory, identifier);
        match directory.close_account(identifier) {
            Ok(paid_out) => {
                store.save(directory).await?;
                let line = format!(
                    "Account #{identifier} closed, ${} withdrawn from {account_label}",
                    format_money(paid_out)
                );
                self.say(&line).await?;
                self.pause().await?;
                Ok(Flow::Leave)
            }
            Err(e) => {
                self.report(&e).await?;
                self.pause().await?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Ask until a strictly positive amount is entered. `None` on cancel.
    async fn prompt_amount(&mut self, prompt: &str) -> Result<Option<Decimal>> {
        loop {
            let Some(input) = self.prompt(prompt).await? else {
                return Ok(None);
            };
            if input.eq_ignore_ascii_case(CANCEL) {
                return Ok(None);
            }

            match parse_amount(&input) {
                Ok(amount) => return Ok(Some(amount)),
                Err(_) if input.parse::<Decimal>().is_ok() => {
                    self.say("Amount must be greater than 0").await?
                }
                Err(_) => self.say("Please enter a valid number").await?,
            }
        }
    }

    /// Ask until an existing account number is entered. `None` on cancel.
    async fn prompt_account(&mut self, directory: &Directory, prompt: &str) -> Result<Option<String>> {
        loop {
            let Some(input) = self.prompt(prompt).await? else {
                return Ok(None);
            };
            if input.eq_ignore_ascii_case(CANCEL) {
                return Ok(None);
            }
            if directory.contains(&input) {
                return Ok(Some(input));
            }
            self.say("Account not found. Please try again or type 'cancel'.")
                .await?;
        }
    }

    async fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(self
            .prompt(prompt)
            .await?
            .is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
    }

    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            self.input_closed = true;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn pause(&mut self) -> Result<()> {
        self.prompt("Press Enter to continue...").await?;
        Ok(())
    }

    async fn say(&mut self, line: &str) -> Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        Ok(())
    }

    async fn report(&mut self, error: &LedgerError) -> Result<()> {
        self.say(&format!("[ERROR] {error}")).await
    }

    async fn clear(&mut self) -> Result<()> {
        if self.clear_screen {
            self.output.write_all(CLEAR_SCREEN.as_bytes()).await?;
        }
        Ok(())
    }
}

fn label(directory: &Directory, identifier: &str) -> String {
    match directory.get(identifier) {
        Some(ledger) => format!("[#{} - {}]", identifier, ledger.owner_name()),
        None => format!("[#{identifier}]"),
    }
}

/// `n) [M/D/YYYY H:MM] - Kind - ($amount ...)`
pub fn render_transaction(index: usize, tx: &Transaction) -> String {
    let head = format!(
        "{}) [{}] - {} - (${}",
        index,
        format_timestamp(&tx.timestamp()),
        tx.kind(),
        format_money(tx.amount())
    );

    match tx {
        Transaction::TransferOut { to, .. } => format!("{head} to #{to})"),
        Transaction::TransferIn { from, .. } => format!("{head} from #{from})"),
        Transaction::Deposit { .. } | Transaction::Withdrawal { .. } => format!("{head})"),
    }
}
