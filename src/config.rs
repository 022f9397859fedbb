use crate::error::AppError;
use crate::solana::models::AccountKey;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// All configuration values are validated during construction to fail fast
/// if the environment is misconfigured.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub log_level: String,
    pub worker_count: usize,
    pub exchange_program_ids: Vec<AccountKey>,
    pub metrics_port: Option<u16>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - INPUT_PATH: File of ledger transaction responses (JSON array, object or JSON Lines)
    ///
    /// Optional environment variables:
    /// - OUTPUT_PATH: Where parsed transactions are written as JSON Lines (default: stdout)
    /// - LOG_LEVEL: Logging level (default: "info")
    /// - WORKER_COUNT: Maximum concurrent parse tasks (default: available parallelism)
    /// - EXCHANGE_PROGRAM_IDS: Comma-separated extra exchange program addresses
    /// - METRICS_PORT: Port for the Prometheus metrics server (disabled when unset)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let input_path = lookup("INPUT_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Config("INPUT_PATH not set".to_string()))?;

        let output_path = lookup("OUTPUT_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let worker_count = match lookup("WORKER_COUNT") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|&count| count > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("WORKER_COUNT must be a positive integer, got: {}", value))
                })?,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };

        let exchange_program_ids = match lookup("EXCHANGE_PROGRAM_IDS") {
            Some(list) => Self::parse_program_ids(&list)?,
            None => Vec::new(),
        };

        let metrics_port = match lookup("METRICS_PORT") {
            Some(port) => Some(port.parse::<u16>().map_err(|e| {
                AppError::Config(format!("Invalid METRICS_PORT {:?}: {}", port, e))
            })?),
            None => None,
        };

        Ok(Self {
            input_path,
            output_path,
            log_level,
            worker_count,
            exchange_program_ids,
            metrics_port,
        })
    }

    /// Validate each comma-separated entry as a 32-byte base58 address.
    fn parse_program_ids(list: &str) -> Result<Vec<AccountKey>, AppError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry.parse::<AccountKey>().map_err(|e| {
                    AppError::Config(format!("Invalid exchange program id {}: {}", entry, e))
                })
            })
            .collect()
    }
}
