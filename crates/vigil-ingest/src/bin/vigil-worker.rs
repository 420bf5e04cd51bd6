//! Standalone worker process that drains the durable submission queue.
//!
//! Runs until killed; the host supervisor owns its lifecycle.

use std::path::Path;
use std::sync::Arc;

use vigil_core::VigilConfig;
use vigil_ingest::{factory, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vigil.toml".to_string());
    let config = VigilConfig::load(Path::new(&config_path))?;
    tracing::info!(
        config = %config_path,
        queue_db = %config.queue_db_path().display(),
        "starting ingest worker"
    );

    let worker = Arc::new(factory::build_worker(&config)?);
    worker.spawn().await?;
    Ok(())
}
