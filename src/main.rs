use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rav_core::config::{note_author_from_env_value, records_file_from_env_value};
use rav_core::{CoreConfig, EducationCatalog, RecordStore};
use rav_dashboard::{router, AppState};

/// Main entry point for the Risk Adjustment Viewer
///
/// Loads and validates the patient records once, then serves the HTML dashboard.
///
/// # Environment Variables
/// - `RAV_ADDR`: dashboard address (default: "0.0.0.0:3000")
/// - `RAV_RECORDS_FILE`: YAML or JSON records file (default: the embedded synthetic dataset)
/// - `RAV_NOTE_AUTHOR`: author recorded on session notes (default: "Current User")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the records fail to load or validate,
/// - the server address cannot be parsed or bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("rav=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("RAV_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    let cfg = Arc::new(CoreConfig::new(
        records_file_from_env_value(std::env::var("RAV_RECORDS_FILE").ok()),
        note_author_from_env_value(std::env::var("RAV_NOTE_AUTHOR").ok()),
    )?);

    let store = RecordStore::load(&*cfg.record_source())?;
    let catalog = EducationCatalog::embedded()?;
    let app = router(AppState::new(cfg, store, catalog));

    tracing::info!("++ Starting RAV dashboard on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
