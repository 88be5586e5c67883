use anyhow::Result;
use bank_ledger::cli;
use bank_ledger::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bank-ledger")]
#[command(about = "Manage bank accounts and their transaction ledgers")]
struct Cli {
    /// Accounts file, overrides BANK_LEDGER_DATA
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Menu-driven session (default)
    Interactive,
    /// Apply a CSV of operations and print the resulting balances
    Batch { input: PathBuf },
    /// Print an account's transaction history as CSV
    Statement { account: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so console and CSV output stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Config::from_env()?.with_data_path(args.data);

    match args.command.unwrap_or(Command::Interactive) {
        Command::Interactive => cli::run_interactive(&config).await?,
        Command::Batch { input } => cli::run_batch(&config, input).await?,
        Command::Statement { account } => cli::run_statement(&config, &account).await?,
    }

    Ok(())
}
