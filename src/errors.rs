use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid amount")]
    InvalidAmount,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("cannot transfer to the same account")]
    SelfTransfer,
    #[error("account #{0} not found")]
    AccountNotFound(String),
    #[error("account #{0} already exists")]
    DuplicateAccount(String),
    #[error("account #{identifier} still holds {balance}")]
    NonZeroBalance {
        identifier: String,
        balance: Decimal,
    },
    #[error("account #{identifier} is corrupt: {reason}")]
    CorruptLedger { identifier: String, reason: String },
}

impl LedgerError {
    pub fn corrupt(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptLedger {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Rejections the caller can recover from by changing its input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::CorruptLedger { .. })
    }
}
