//! Database primitives shared by the server and the HR slice.

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::info;

/// Shared connection pool alias.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing (set {0})")]
    MissingUrl(String),
    #[error("failed to connect to database: {0}")]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    env_key: String,
    max_connections: Option<u32>,
    connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            env_key: default_url_key(),
            max_connections: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_url_key() -> String {
    "DATABASE_URL".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    8
}

impl DatabaseSettings {
    /// Reads `DATABASE_URL` plus the optional `DB_MAX_CONNECTIONS` override.
    pub fn from_env() -> Self {
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u32>().ok());
        Self {
            max_connections,
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> DbResult<String> {
        std::env::var(&self.env_key).map_err(|_| DbError::MissingUrl(self.env_key.clone()))
    }

    fn connect_options(&self, url: String) -> ConnectOptions {
        let mut options = ConnectOptions::new(url);
        options
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .sqlx_logging(false);
        if let Some(max) = self.max_connections {
            options.max_connections(max);
        }
        options
    }
}

/// Open a pool using the URL named by `settings`.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url()?;
    let pool = Database::connect(settings.connect_options(url)).await?;
    info!(backend = ?pool.get_database_backend(), "database pool ready");
    Ok(pool)
}
