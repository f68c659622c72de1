//! Cabin Pipeline - Main Entry Point

use anyhow::Context;
use api::{init_logging, init_metrics, run_server, Settings};
use dispatcher::LoggingEffector;
use pipeline::{CabinService, NoopInference};
use std::sync::Arc;
use storage::{JsonMappingStore, MappingStore};
use stream_capture::HttpStreamSource;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_logging(&settings.log)?;

    info!("=== Cabin Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = &settings.metrics_addr {
        init_metrics(addr).context("Failed to start metrics exporter")?;
    }

    let config = settings.pipeline_config();
    if config.gesture.demo_mode {
        info!("Demo mode: wake gate, static filter and driver zone disabled");
    }

    let store: Arc<dyn MappingStore> = Arc::new(JsonMappingStore::new(settings.mapping_file.clone()));
    warn!("No landmark model configured, gestures and mood will stay idle");

    let service = CabinService::spawn(
        config.clone(),
        HttpStreamSource::new(&config.capture),
        Box::new(NoopInference),
        store,
        Arc::new(LoggingEffector),
    );

    if let Some(url) = &settings.stream_url {
        service.start_stream(url).await?;
    }

    run_server(&settings.listen_addr, service.clone()).await?;
    service.shutdown().await?;

    info!("Cabin pipeline stopped");
    Ok(())
}
