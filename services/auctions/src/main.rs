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

mod bidding;
mod forms;
mod models;
mod repositories;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use crate::{repositories::listings::PgAuctionStore, state::AppState};

const SCHEMA: &str = include_str!("../sql/schema.sql");

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting auctions service");

    let server: ServerSettings =
        settings::load("AUCTIONS", &[("host", "0.0.0.0"), ("port", "3000")])?;

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
        store: Arc::new(PgAuctionStore::new(pool.clone())),
        users: Arc::new(PgUserStore::new(pool)),
        jwt: JwtService::new(JwtConfig::from_env()?),
    };

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(server.address()).await?;
    info!("Auctions service listening on {}", server.address());

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SCHEMA;

    #[test]
    fn test_schema_comments_do_not_split_statements() {
        for line in SCHEMA.lines().filter(|l| l.trim_start().starts_with("--")) {
            assert!(!line.contains(';'), "comment contains ';': {}", line);
        }
    }
}
