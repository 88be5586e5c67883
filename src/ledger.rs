use crate::credentials::Credentials;
use crate::errors::LedgerError;
use crate::models::{validate_amount, Transaction};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Balance and append-only history of a single account.
///
/// # Invariants
/// - `balance` is never negative
/// - every balance change is paired with exactly one appended [`Transaction`]
/// - replaying `history` from zero yields `balance`
///
/// Fields are private so that the three mutating operations are the only way
/// to move money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LedgerRecord")]
pub struct Ledger {
    #[serde(rename = "accountNumber")]
    identifier: String,
    #[serde(rename = "name")]
    owner_name: String,
    #[serde(rename = "address")]
    owner_address: Option<String>,
    #[serde(flatten)]
    credentials: Credentials,
    #[serde(rename = "creationDate")]
    created_at: DateTime<Utc>,
    balance: Decimal,
    #[serde(rename = "transactions")]
    history: Vec<Transaction>,
}

impl Ledger {
    /// Open an empty ledger. Any initial funds must go through [`Ledger::deposit`].
    pub fn new(
        identifier: impl Into<String>,
        owner_name: impl Into<String>,
        owner_address: Option<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            owner_name: owner_name.into(),
            owner_address,
            credentials,
            created_at: Utc::now(),
            balance: Decimal::ZERO,
            history: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn owner_address(&self) -> Option<&str> {
        self.owner_address.as_deref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        let amount = validate_amount(amount).inspect_err(|e| self.log_rejection("deposit", e))?;
        let balance =
            exact_add(self.balance, amount).inspect_err(|e| self.log_rejection("deposit", e))?;

        self.balance = balance;
        self.history.push(Transaction::Deposit {
            amount,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        let amount = validate_amount(amount).inspect_err(|e| self.log_rejection("withdraw", e))?;

        if amount > self.balance {
            let e = LedgerError::InsufficientFunds;
            self.log_rejection("withdraw", &e);
            return Err(e);
        }

        let balance =
            exact_sub(self.balance, amount).inspect_err(|e| self.log_rejection("withdraw", e))?;

        self.balance = balance;
        self.history.push(Transaction::Withdrawal {
            amount,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Move `amount` from this ledger to `target` as one unit.
    ///
    /// Every check runs before either ledger is touched, so a rejected
    /// transfer leaves both balances and both histories as they were. Both
    /// records carry the same timestamp.
    pub fn transfer(&mut self, target: &mut Ledger, amount: Decimal) -> Result<(), LedgerError> {
        let amount = validate_amount(amount).inspect_err(|e| self.log_rejection("transfer", e))?;

        if self.identifier == target.identifier {
            let e = LedgerError::SelfTransfer;
            self.log_rejection("transfer", &e);
            return Err(e);
        }

        if amount > self.balance {
            let e = LedgerError::InsufficientFunds;
            self.log_rejection("transfer", &e);
            return Err(e);
        }

        let source_balance =
            exact_sub(self.balance, amount).inspect_err(|e| self.log_rejection("transfer", e))?;
        let target_balance =
            exact_add(target.balance, amount).inspect_err(|e| self.log_rejection("transfer", e))?;

        let timestamp = Utc::now();

        self.balance = source_balance;
        self.history.push(Transaction::TransferOut {
            amount,
            timestamp,
            to: target.identifier.clone(),
        });

        target.balance = target_balance;
        target.history.push(Transaction::TransferIn {
            amount,
            timestamp,
            from: self.identifier.clone(),
        });

        Ok(())
    }

    fn log_rejection(&self, operation: &str, error: &LedgerError) {
        debug!(
            account = %self.identifier,
            balance = %self.balance,
            operation,
            error = %error,
            "Rejected ledger operation"
        );
    }
}

/// Wire shape of a ledger; validated into a [`Ledger`] on load.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerRecord {
    account_number: String,
    name: String,
    #[serde(default)]
    address: Option<String>,
    password_hash: String,
    salt: String,
    #[serde(deserialize_with = "deserialize_creation_date")]
    creation_date: DateTime<Utc>,
    balance: Decimal,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl TryFrom<LedgerRecord> for Ledger {
    type Error = LedgerError;

    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        let replayed = replay(&record.account_number, &record.transactions)?;

        if replayed != record.balance {
            return Err(LedgerError::corrupt(
                record.account_number,
                format!(
                    "balance {} does not match history total {}",
                    record.balance, replayed
                ),
            ));
        }

        Ok(Self {
            identifier: record.account_number,
            owner_name: record.name,
            owner_address: record.address,
            credentials: Credentials {
                password_hash: record.password_hash,
                salt: record.salt,
            },
            created_at: record.creation_date,
            balance: record.balance,
            history: record.transactions,
        })
    }
}

/// Rebuild a balance from its history, checking every intermediate state.
fn replay(identifier: &str, history: &[Transaction]) -> Result<Decimal, LedgerError> {
    history
        .iter()
        .enumerate()
        .try_fold(Decimal::ZERO, |running, (index, tx)| {
            if tx.amount() <= Decimal::ZERO {
                return Err(LedgerError::corrupt(
                    identifier,
                    format!("entry {} has non-positive amount {}", index + 1, tx.amount()),
                ));
            }

            if tx.counterparty() == Some(identifier) {
                return Err(LedgerError::corrupt(
                    identifier,
                    format!("entry {} transfers to itself", index + 1),
                ));
            }

            match running.checked_add(tx.balance_delta()) {
                Some(next) if next >= Decimal::ZERO => Ok(next),
                _ => Err(LedgerError::corrupt(
                    identifier,
                    format!("entry {} drives the balance negative", index + 1),
                )),
            }
        })
}

/// `balance + amount`, refusing results that need more digits than a
/// `Decimal` holds and so come back rounded.
fn exact_add(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    match balance.checked_add(amount) {
        Some(sum) if sum - balance == amount => Ok(sum),
        _ => Err(LedgerError::InvalidAmount),
    }
}

fn exact_sub(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    match balance.checked_sub(amount) {
        Some(rest) if balance - rest == amount => Ok(rest),
        _ => Err(LedgerError::InvalidAmount),
    }
}

/// RFC 3339, or an offset-free ISO timestamp read as UTC. Older account files
/// stored the creation date without an offset.
fn deserialize_creation_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid creationDate {raw:?}: {e}")))
}
