// src/utils/db_connect.rs
use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::info;
use std::env;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

const APPLICATION_NAME: &str = "counterparty_dedupe";
const POOL_MAX_SIZE: u32 = 16;

/// Connection settings read from `POSTGRES_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl PgSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("POSTGRES_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("POSTGRES_PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(5432),
            dbname: lookup("POSTGRES_DB").unwrap_or_else(|| "counterparties".to_string()),
            user: lookup("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string()),
            password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
        }
    }
}

/// Builds the tokio-postgres config for `settings`.
pub fn build_pg_config(settings: &PgSettings) -> Config {
    info!(
        "DB Config: Host={}, Port={}, DB={}, User={}",
        settings.host, settings.port, settings.dbname, settings.user
    );
    let mut config = Config::new();
    config
        .host(&settings.host)
        .port(settings.port)
        .dbname(&settings.dbname)
        .user(&settings.user)
        .password(&settings.password);
    config.application_name(APPLICATION_NAME);
    config.connect_timeout(Duration::from_secs(10));
    config
}

/// Initializes the database connection pool and checks it with `SELECT 1`.
pub async fn connect() -> Result<PgPool> {
    let config = build_pg_config(&PgSettings::from_env());
    info!("Connecting to PostgreSQL database...");
    let manager = PostgresConnectionManager::new(config, NoTls);

    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .min_idle(Some(1))
        .idle_timeout(Some(Duration::from_secs(180)))
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    {
        let conn = pool
            .get()
            .await
            .context("Failed to get test connection from pool")?;
        conn.query_one("SELECT 1", &[])
            .await
            .context("Test query 'SELECT 1' failed")?;
    }
    info!("Database connection pool initialized successfully.");
    Ok(pool)
}

/// (open connections, idle connections)
pub fn get_pool_status(pool: &PgPool) -> (u32, u32) {
    let state = pool.state();
    (state.connections, state.idle_connections)
}
