//! Process configuration, read once at startup.

use std::net::SocketAddr;

use anyhow::Context as _;

/// Everything the server needs from its environment.
///
/// All values come from environment variables (a `.env` file is honored in
/// development). The token-signing secret has no default on purpose.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to (`BIND_ADDRESS`).
    pub bind_address: SocketAddr,
    /// MongoDB connection string (`MONGODB_URI`).
    pub mongodb_uri: String,
    /// Name of the database holding all collections (`DATABASE_NAME`).
    pub database: String,
    /// Secret used to sign and verify bearer tokens (`JWT_SECRET`).
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(address) => address.parse().context("invalid BIND_ADDRESS")?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        Ok(Self {
            bind_address,
            mongodb_uri: std::env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_owned()),
            database: std::env::var("DATABASE_NAME").unwrap_or_else(|_| "bookshelf".to_owned()),
            jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        })
    }
}
