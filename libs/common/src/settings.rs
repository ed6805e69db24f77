//! Service settings loaded from defaults and prefixed environment variables
//!
//! Every service describes its settings as a `Deserialize` struct and loads it
//! with [`load`]. Environment variables override defaults, e.g.
//! `AUCTIONS_PORT=8080` or `ENCYCLOPEDIA_ENTRIES_DIR=/srv/entries`.

use anyhow::Result;
use config::{Config, Environment};
use serde::{Deserialize, de::DeserializeOwned};

/// Host and port a service binds to
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// Socket address string for `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load settings of type `T` from `defaults`, overridden by `{PREFIX}_*` variables
pub fn load<T: DeserializeOwned>(prefix: &str, defaults: &[(&str, &str)]) -> Result<T> {
    let mut builder = Config::builder();
    for (key, value) in defaults {
        builder = builder.set_default(*key, *value)?;
    }

    let settings = builder
        .add_source(Environment::with_prefix(prefix).try_parsing(true))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
