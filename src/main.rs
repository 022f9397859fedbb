use std::sync::Arc;
use tokio::io::AsyncWrite;
use trade_decoder::config::AppConfig;
use trade_decoder::error::AppError;
use trade_decoder::{metrics, metrics_server, pipeline, telemetry};
use trade_decoder::{ProgramRegistry, TransactionParser};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    telemetry::init_telemetry(&config.log_level);

    metrics::init_metrics()?;

    info!("Starting trade decoder");
    info!(
        input = %config.input_path.display(),
        workers = config.worker_count,
        extra_exchange_programs = config.exchange_program_ids.len(),
        "Configuration loaded"
    );

    if let Some(port) = config.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = metrics_server::start_metrics_server(port).await {
                error!(error = %e, "Metrics server error");
            }
        });
    }

    let registry = ProgramRegistry::new(config.exchange_program_ids.iter().copied());
    let parser = Arc::new(TransactionParser::new(registry));

    let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match &config.output_path {
        Some(path) => Box::new(tokio::fs::File::create(path).await?),
        None => Box::new(tokio::io::stdout()),
    };

    let summary =
        pipeline::run_batch(parser, &config.input_path, config.worker_count, &mut writer).await?;

    info!(
        parsed = summary.parsed,
        rejected = summary.rejected,
        trades = summary.trades,
        trade_pairs = summary.trade_pairs,
        "Batch complete"
    );

    if config.metrics_port.is_some() {
        info!("Serving metrics until Ctrl-C");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
