use anyhow::Result;
use common::{settings, telemetry::init_tracing};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::info;

mod routes;
mod search;
mod state;
mod storage;

use crate::{state::AppState, storage::EntryStore};

/// Encyclopedia settings (`ENCYCLOPEDIA_HOST`, `ENCYCLOPEDIA_PORT`, `ENCYCLOPEDIA_ENTRIES_DIR`)
#[derive(Debug, Deserialize)]
struct Settings {
    host: String,
    port: u16,
    entries_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting encyclopedia service");

    let settings: Settings = settings::load(
        "ENCYCLOPEDIA",
        &[("host", "0.0.0.0"), ("port", "3002"), ("entries_dir", "entries")],
    )?;

    let entries = EntryStore::new(&settings.entries_dir);
    entries.ensure_dir().await?;
    info!("Serving entries from {}", entries.dir().display());

    let app = routes::create_router(AppState { entries });

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Encyclopedia service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
