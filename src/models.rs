use crate::errors::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One balance-affecting event in a ledger's history.
///
/// Records are immutable once appended; the serialized `type` tags match the
/// accounts file written by earlier versions of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Transaction {
    #[serde(rename = "deposit")]
    Deposit {
        amount: Decimal,
        #[serde(rename = "date")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "withdrawal")]
    Withdrawal {
        amount: Decimal,
        #[serde(rename = "date")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "transferSend")]
    TransferOut {
        amount: Decimal,
        #[serde(rename = "date")]
        timestamp: DateTime<Utc>,
        to: String,
    },
    #[serde(rename = "transferReceive")]
    TransferIn {
        amount: Decimal,
        #[serde(rename = "date")]
        timestamp: DateTime<Utc>,
        from: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Deposit { .. } => TransactionKind::Deposit,
            Transaction::Withdrawal { .. } => TransactionKind::Withdrawal,
            Transaction::TransferOut { .. } => TransactionKind::TransferOut,
            Transaction::TransferIn { .. } => TransactionKind::TransferIn,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Transaction::Deposit { amount, .. }
            | Transaction::Withdrawal { amount, .. }
            | Transaction::TransferOut { amount, .. }
            | Transaction::TransferIn { amount, .. } => *amount,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Transaction::Deposit { timestamp, .. }
            | Transaction::Withdrawal { timestamp, .. }
            | Transaction::TransferOut { timestamp, .. }
            | Transaction::TransferIn { timestamp, .. } => *timestamp,
        }
    }

    /// Identifier of the other ledger, for transfers only.
    pub fn counterparty(&self) -> Option<&str> {
        match self {
            Transaction::TransferOut { to, .. } => Some(to),
            Transaction::TransferIn { from, .. } => Some(from),
            Transaction::Deposit { .. } | Transaction::Withdrawal { .. } => None,
        }
    }

    /// Signed effect on the owning ledger's balance.
    pub fn balance_delta(&self) -> Decimal {
        match self {
            Transaction::Deposit { amount, .. } | Transaction::TransferIn { amount, .. } => *amount,
            Transaction::Withdrawal { amount, .. } | Transaction::TransferOut { amount, .. } => {
                -*amount
            }
        }
    }
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferOut => "transferSend",
            TransactionKind::TransferIn => "transferReceive",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
            TransactionKind::TransferOut => "Transfer Send",
            TransactionKind::TransferIn => "Transfer Receive",
        };
        f.write_str(label)
    }
}

/// Summary row written after a batch run.
#[derive(Debug)]
pub struct AccountOutput {
    pub account: String,
    pub balance: Decimal,
    pub transactions: usize,
}

impl From<&crate::ledger::Ledger> for AccountOutput {
    fn from(ledger: &crate::ledger::Ledger) -> Self {
        Self {
            account: ledger.identifier().to_string(),
            balance: ledger.balance(),
            transactions: ledger.history().len(),
        }
    }
}

/// Parse user-supplied text into a strictly positive exact amount.
pub fn parse_amount(input: &str) -> Result<Decimal, LedgerError> {
    let amount = Decimal::from_str(input.trim()).map_err(|_| LedgerError::InvalidAmount)?;
    validate_amount(amount)
}

pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(amount)
}

/// Render an amount as `1,234.56` (two places, half-even rounding).
pub fn format_money(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{fraction}")
}

/// Short `M/D/YYYY H:MM` form used in history listings.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%-m/%-d/%Y %-H:%M").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Open,
    Deposit,
    Withdrawal,
    Transfer,
    Close,
}

/// One row of a batch file: `type,account,amount,counterparty,name,password`.
///
/// Trailing columns may be omitted when an operation does not use them.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRow {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub account: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl OperationRow {
    /// Amount column parsed exactly from its text, if present.
    pub fn amount(&self) -> Result<Option<Decimal>, LedgerError> {
        self.amount.as_deref().map(parse_amount).transpose()
    }

    pub fn required_amount(&self) -> Result<Decimal, LedgerError> {
        self.amount()?.ok_or(LedgerError::InvalidAmount)
    }
}
