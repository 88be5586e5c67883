use crate::ledger::Ledger;
use crate::models::{AccountOutput, OperationRow};
use csv_async::AsyncReaderBuilder;
use futures::stream::Stream;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::compat::TokioAsyncReadCompatExt;

/// Stream batch operations from async reader
pub fn stream_operations<R: AsyncRead + Unpin + Send + 'static>(
    reader: R,
) -> impl Stream<Item = Result<OperationRow, csv_async::Error>> {
    let compat_reader = reader.compat();
    let csv_reader = AsyncReaderBuilder::new()
        .trim(csv_async::Trim::All)
        .flexible(true)
        .create_deserializer(compat_reader);

    csv_reader.into_deserialize::<OperationRow>()
}

pub async fn write_accounts<W: AsyncWrite + Unpin>(
    mut writer: W,
    accounts: Vec<AccountOutput>,
) -> Result<(), anyhow::Error> {
    writer.write_all(b"account,balance,transactions\n").await?;

    for account in accounts {
        let line = format!(
            "{},{:.2},{}\n",
            account.account,
            account.balance.round_dp(2),
            account.transactions
        );
        writer.write_all(line.as_bytes()).await?;
    }

    writer.flush().await?;
    Ok(())
}

/// Full history of one ledger, oldest first, with exact amounts.
pub async fn write_statement<W: AsyncWrite + Unpin>(
    mut writer: W,
    ledger: &Ledger,
) -> Result<(), anyhow::Error> {
    writer.write_all(b"n,date,type,amount,counterparty\n").await?;

    for (i, tx) in ledger.history().iter().enumerate() {
        let line = format!(
            "{},{},{},{},{}\n",
            i + 1,
            tx.timestamp().to_rfc3339(),
            tx.kind().as_str(),
            tx.amount(),
            tx.counterparty().unwrap_or_default()
        );
        writer.write_all(line.as_bytes()).await?;
    }

    writer.flush().await?;
    Ok(())
}
