pub mod config;
pub mod error;
pub mod metrics;
pub mod metrics_server;
pub mod pipeline;
pub mod solana;
pub mod telemetry;

pub use crate::solana::models::{ParsedTransaction, RawTransaction};
pub use crate::solana::parser::TransactionParser;
pub use crate::solana::programs::ProgramRegistry;
