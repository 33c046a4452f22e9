//! Compliance Server Binary
//!
//! Standalone server for the research compliance API.

use std::sync::Arc;

use compliance_core::ComplianceConfig;
use compliance_server::{serve, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,compliance_server=debug")),
        )
        .init();

    let config = ComplianceConfig::load_standard()?;

    let addr = config.server.addr.clone();
    let state = Arc::new(AppState::from_config(config)?);

    serve(&addr, state).await
}
