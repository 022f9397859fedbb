use crate::error::AppError;
use crate::metrics;
use crate::solana::models::{ParsedTransaction, RawTransaction, TransactionType};
use crate::solana::parser::TransactionParser;
use crate::solana::rpc::RpcTransaction;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Summary of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub parsed: usize,
    pub rejected: usize,
    pub trades: usize,
    pub trade_pairs: usize,
}

/// Read ledger responses from `path`.
///
/// Accepts a JSON array, a single JSON object, or one object per line.
pub async fn load_transactions(path: &Path) -> Result<Vec<RpcTransaction>, AppError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_input(&contents)
}

pub fn parse_input(contents: &str) -> Result<Vec<RpcTransaction>, AppError> {
    let trimmed = contents.trim_start();

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    // Single object or JSON Lines
    let mut transactions = Vec::new();
    for item in serde_json::Deserializer::from_str(trimmed).into_iter::<RpcTransaction>() {
        transactions.push(item?);
    }
    Ok(transactions)
}

/// Convert envelopes into raw records, dropping (and counting) any that fail to decode.
pub fn prepare(envelopes: Vec<RpcTransaction>) -> (Vec<RawTransaction>, usize) {
    let mut rejected = 0;
    let raws = envelopes
        .into_iter()
        .enumerate()
        .filter_map(|(position, envelope)| {
            let signature = envelope.transaction.signatures.first().cloned();
            match RawTransaction::try_from(envelope) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    rejected += 1;
                    metrics::record_rejected();
                    warn!(
                        position,
                        signature = signature.as_deref().unwrap_or("<none>"),
                        error = %e,
                        "Skipping transaction that failed to decode"
                    );
                    None
                }
            }
        })
        .collect();

    (raws, rejected)
}

/// Parse every record with at most `workers` parses in flight.
///
/// Results come back in input order.
pub async fn parse_batch(
    parser: Arc<TransactionParser>,
    raws: Vec<RawTransaction>,
    workers: usize,
) -> Result<Vec<ParsedTransaction>, AppError> {
    let results: Vec<_> = stream::iter(raws)
        .map(|raw| {
            let parser = parser.clone();
            tokio::task::spawn_blocking(move || {
                let started = Instant::now();
                let parsed = parser.parse_transaction(&raw);
                metrics::record_parsed(&parsed, started.elapsed());
                parsed
            })
        })
        .buffered(workers.max(1))
        .collect()
        .await;

    results
        .into_iter()
        .map(|joined| {
            joined.map_err(|e| AppError::InvalidTransaction(format!("Parse task failed: {}", e)))
        })
        .collect()
}

/// Write one JSON object per line.
pub async fn write_output<W>(writer: &mut W, parsed: &[ParsedTransaction]) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    for tx in parsed {
        let mut line = serde_json::to_vec(tx)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Load, parse and emit a whole input file.
pub async fn run_batch<W>(
    parser: Arc<TransactionParser>,
    input: &Path,
    workers: usize,
    writer: &mut W,
) -> Result<BatchSummary, AppError>
where
    W: AsyncWrite + Unpin,
{
    let envelopes = load_transactions(input).await?;
    info!(count = envelopes.len(), path = %input.display(), "Loaded ledger transactions");

    let (raws, rejected) = prepare(envelopes);
    let parsed = parse_batch(parser, raws, workers).await?;

    for tx in &parsed {
        debug!(
            signature = tx.signature.as_deref().unwrap_or("<none>"),
            slot = tx.slot,
            transaction_type = ?tx.transaction_type,
            instructions = tx.instructions.len(),
            trade_pairs = tx.trade_pairs.len(),
            "Parsed transaction"
        );
    }

    write_output(writer, &parsed).await?;

    let summary = BatchSummary {
        parsed: parsed.len(),
        rejected,
        trades: parsed
            .iter()
            .filter(|tx| tx.transaction_type == TransactionType::Trade)
            .count(),
        trade_pairs: parsed.iter().map(|tx| tx.trade_pairs.len()).sum(),
    };

    Ok(summary)
}
