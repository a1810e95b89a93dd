use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use notealign::{config, server, AlignmentEngine};

#[tokio::main]
async fn main() -> Result<(), server::ServeError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let engine = Arc::new(AlignmentEngine::with_canonical());
    tracing::info!(criteria = engine.catalog().len(), "criteria catalog loaded");

    server::serve(engine).await
}
