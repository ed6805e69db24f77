use std::sync::Arc;

use anyhow::Result;
use common::{
    accounts::{PgUserStore, USERS_SCHEMA},
    auth::{JwtConfig, JwtService},
    database::{DatabaseConfig, apply_schema, health_check, init_pool},
    settings::{self, ServerSettings},
    telemetry::init_tracing,
};
use tokio::net::TcpListener;
use tracing::info;

mod models;
mod repositories;
mod routes;
mod social;
mod state;
#[cfg(test)]
mod test_support;

use crate::{repositories::posts::PgNetworkStore, state::AppState};

const SCHEMA: &str = include_str!("../sql/schema.sql");

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting network service");

    let server: ServerSettings =
        settings::load("NETWORK", &[("host", "0.0.0.0"), ("port", "3001")])?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    apply_schema(&pool, USERS_SCHEMA).await?;
    apply_schema(&pool, SCHEMA).await?;

    let app_state = AppState {
        store: Arc::new(PgNetworkStore::new(pool.clone())),
        users: Arc::new(PgUserStore::new(pool)),
        jwt: JwtService::new(JwtConfig::from_env()?),
    };

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(server.address()).await?;
    info!("Network service listening on {}", server.address());

    axum::serve(listener, app).await?;

    Ok(())
}
