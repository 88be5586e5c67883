use crate::credentials::Credentials;
use crate::errors::LedgerError;
use crate::ledger::Ledger;
use crate::models::validate_amount;
use rand::Rng;
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

const IDENTIFIER_LEN: usize = 9;

/// Every open ledger, keyed by account identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Directory {
    ledgers: BTreeMap<String, Ledger>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.ledgers.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&Ledger> {
        self.ledgers.get(identifier)
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut Ledger> {
        self.ledgers.get_mut(identifier)
    }

    /// Ledgers in identifier order.
    pub fn ledgers(&self) -> impl Iterator<Item = &Ledger> {
        self.ledgers.values()
    }

    pub fn insert(&mut self, ledger: Ledger) -> Result<(), LedgerError> {
        if self.ledgers.contains_key(ledger.identifier()) {
            return Err(LedgerError::DuplicateAccount(ledger.identifier().to_string()));
        }
        self.ledgers.insert(ledger.identifier().to_string(), ledger);
        Ok(())
    }

    /// Remove a ledger whose balance has already been driven to zero.
    pub fn remove(&mut self, identifier: &str) -> Result<Ledger, LedgerError> {
        let ledger = self.lookup(identifier)?;
        if !ledger.balance().is_zero() {
            return Err(LedgerError::NonZeroBalance {
                identifier: identifier.to_string(),
                balance: ledger.balance(),
            });
        }

        self.ledgers
            .remove(identifier)
            .ok_or_else(|| LedgerError::AccountNotFound(identifier.to_string()))
    }

    /// Create a ledger under a fresh identifier and apply the optional
    /// initial deposit as a regular transaction.
    pub fn open_account(
        &mut self,
        owner_name: &str,
        owner_address: Option<String>,
        credentials: Credentials,
        initial_deposit: Option<Decimal>,
    ) -> Result<String, LedgerError> {
        let initial_deposit = initial_deposit.map(validate_amount).transpose()?;
        let identifier = self.generate_identifier();
        self.open_account_with_id(&identifier, owner_name, owner_address, credentials, initial_deposit)?;
        Ok(identifier)
    }

    pub fn open_account_with_id(
        &mut self,
        identifier: &str,
        owner_name: &str,
        owner_address: Option<String>,
        credentials: Credentials,
        initial_deposit: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        if self.contains(identifier) {
            return Err(LedgerError::DuplicateAccount(identifier.to_string()));
        }

        let mut ledger = Ledger::new(identifier, owner_name, owner_address, credentials);
        if let Some(amount) = initial_deposit {
            ledger.deposit(amount)?;
        }

        info!(
            account = identifier,
            balance = %ledger.balance(),
            "Opened account"
        );
        self.insert(ledger)
    }

    pub fn deposit(&mut self, identifier: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let ledger = self.lookup_mut(identifier)?;
        ledger.deposit(amount)?;
        info!(account = identifier, amount = %amount, "Deposit committed");
        Ok(ledger.balance())
    }

    pub fn withdraw(&mut self, identifier: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let ledger = self.lookup_mut(identifier)?;
        ledger.withdraw(amount)?;
        info!(account = identifier, amount = %amount, "Withdrawal committed");
        Ok(ledger.balance())
    }

    /// Transfer between two ledgers of this directory. Self-transfers are
    /// rejected before either side is looked at.
    pub fn transfer(&mut self, from: &str, to: &str, amount: Decimal) -> Result<(), LedgerError> {
        validate_amount(amount)?;
        if from == to {
            let e = LedgerError::SelfTransfer;
            debug!(account = from, operation = "transfer", error = %e, "Rejected ledger operation");
            return Err(e);
        }
        if !self.contains(to) {
            return Err(LedgerError::AccountNotFound(to.to_string()));
        }

        let mut source = self
            .ledgers
            .remove(from)
            .ok_or_else(|| LedgerError::AccountNotFound(from.to_string()))?;

        let result = match self.ledgers.get_mut(to) {
            Some(target) => source.transfer(target, amount),
            None => Err(LedgerError::AccountNotFound(to.to_string())),
        };
        self.ledgers.insert(from.to_string(), source);
        result?;

        info!(from, to, amount = %amount, "Transfer committed");
        Ok(())
    }

    /// Withdraw whatever is left and remove the ledger. Returns the amount
    /// paid out.
    pub fn close_account(&mut self, identifier: &str) -> Result<Decimal, LedgerError> {
        let ledger = self.lookup_mut(identifier)?;
        let remaining = ledger.balance();
        if remaining > Decimal::ZERO {
            ledger.withdraw(remaining)?;
        }

        self.remove(identifier)?;
        info!(account = identifier, paid_out = %remaining, "Closed account");
        Ok(remaining)
    }

    fn lookup(&self, identifier: &str) -> Result<&Ledger, LedgerError> {
        self.ledgers
            .get(identifier)
            .ok_or_else(|| LedgerError::AccountNotFound(identifier.to_string()))
    }

    fn lookup_mut(&mut self, identifier: &str) -> Result<&mut Ledger, LedgerError> {
        self.ledgers
            .get_mut(identifier)
            .ok_or_else(|| LedgerError::AccountNotFound(identifier.to_string()))
    }

    fn generate_identifier(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let candidate: String = (0..IDENTIFIER_LEN)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect();
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl<'de> Deserialize<'de> for Directory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ledgers = BTreeMap::<String, Ledger>::deserialize(deserializer)?;

        for (key, ledger) in &ledgers {
            if key != ledger.identifier() {
                return Err(D::Error::custom(LedgerError::corrupt(
                    key.as_str(),
                    format!("stored under key {} but numbered {}", key, ledger.identifier()),
                )));
            }
        }

        Ok(Self { ledgers })
    }
}
