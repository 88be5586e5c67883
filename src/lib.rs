pub mod cli;
pub mod config;
pub mod console;
pub mod credentials;
pub mod csv_io;
pub mod directory;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod storage;

pub use directory::Directory;
pub use errors::LedgerError;
pub use ledger::Ledger;
pub use models::{AccountOutput, OperationRow, OperationType, Transaction, TransactionKind};
pub use storage::{AccountStore, InMemoryStore, JsonFileStore};
