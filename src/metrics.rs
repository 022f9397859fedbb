use crate::error::AppError;
use crate::solana::models::ParsedTransaction;
use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::time::Duration;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    static ref METRICS: Result<DecoderMetrics, String> =
        DecoderMetrics::new().map_err(|e| e.to_string());
}

/// Counters describing decoder throughput and output volume.
pub struct DecoderMetrics {
    pub transactions_parsed: IntCounter,
    pub transactions_rejected: IntCounter,
    pub instructions_decoded: IntCounter,
    pub token_deltas: IntCounter,
    pub trade_pairs: IntCounter,
    pub parse_time: Histogram,
}

fn counter(name: &str, help: &str) -> Result<IntCounter, AppError> {
    IntCounter::new(name, help)
        .map_err(|e| AppError::Metrics(format!("Failed to create {} metric: {}", name, e)))
}

impl DecoderMetrics {
    fn new() -> Result<Self, AppError> {
        let parse_time = Histogram::with_opts(
            HistogramOpts::new(
                "trade_decoder_parse_seconds",
                "Time taken to parse one transaction",
            )
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
        )
        .map_err(|e| AppError::Metrics(format!("Failed to create parse_time metric: {}", e)))?;

        Ok(Self {
            transactions_parsed: counter(
                "trade_decoder_transactions_parsed_total",
                "Total number of transactions parsed",
            )?,
            transactions_rejected: counter(
                "trade_decoder_transactions_rejected_total",
                "Total number of ledger records rejected before parsing",
            )?,
            instructions_decoded: counter(
                "trade_decoder_instructions_decoded_total",
                "Total number of instructions decoded",
            )?,
            token_deltas: counter(
                "trade_decoder_token_deltas_total",
                "Total number of token balance deltas computed",
            )?,
            trade_pairs: counter(
                "trade_decoder_trade_pairs_total",
                "Total number of buy/sell pairs reconstructed",
            )?,
            parse_time,
        })
    }

    fn register(&self) -> Result<(), AppError> {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(self.transactions_parsed.clone()),
            Box::new(self.transactions_rejected.clone()),
            Box::new(self.instructions_decoded.clone()),
            Box::new(self.token_deltas.clone()),
            Box::new(self.trade_pairs.clone()),
            Box::new(self.parse_time.clone()),
        ];

        for collector in collectors {
            match REGISTRY.register(collector) {
                Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
                Err(e) => {
                    return Err(AppError::Metrics(format!("Failed to register metric: {}", e)))
                }
            }
        }

        Ok(())
    }
}

/// Register all metrics with [`REGISTRY`].
///
/// Returns an error if any metric fails to build or register, so startup
/// fails fast. Repeated calls are no-ops.
pub fn init_metrics() -> Result<(), AppError> {
    let metrics = METRICS.as_ref().map_err(|e| AppError::Metrics(e.clone()))?;
    metrics.register()
}

/// The decoder metrics, or None if they could not be built.
pub fn metrics() -> Option<&'static DecoderMetrics> {
    METRICS.as_ref().ok()
}

pub fn record_parsed(parsed: &ParsedTransaction, elapsed: Duration) {
    if let Some(m) = metrics() {
        m.transactions_parsed.inc();
        m.instructions_decoded.inc_by(parsed.instructions.len() as u64);
        m.token_deltas.inc_by(parsed.token_deltas.len() as u64);
        m.trade_pairs.inc_by(parsed.trade_pairs.len() as u64);
        m.parse_time.observe(elapsed.as_secs_f64());
    }
}

pub fn record_rejected() {
    if let Some(m) = metrics() {
        m.transactions_rejected.inc();
    }
}

/// Get the metrics in Prometheus exposition format.
pub fn gather_metrics() -> Result<String, AppError> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Metrics(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| AppError::Metrics(format!("Failed to convert metrics to UTF-8: {}", e)))
}
