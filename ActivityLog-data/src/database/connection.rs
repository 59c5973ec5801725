//! Database connection module for the ActivityLog application
//!
//! SQLite is the only supported backend. The pool is created once per process
//! and shared by every repository through [`get_db_pool`].

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use once_cell::sync::OnceCell;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tracing::{info, error, warn};

use super::migrations::run_sqlite_migrations;

/// Path used when `DB_SQLITE_PATH` is not set
pub const DEFAULT_SQLITE_PATH: &str = "data/activity_log.db";

static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Sqlite,
}

impl FromStr for DatabaseType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("sqlite") {
            Ok(DatabaseType::Sqlite)
        } else {
            Err(DatabaseError::UnsupportedDatabaseType(s.to_string()))
        }
    }
}

/// Database connection pool
#[derive(Debug, Clone)]
pub enum DatabasePool {
    SQLite(Arc<r2d2::Pool<SqliteConnectionManager>>),
}

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub db_type: DatabaseType,
    /// Path to the SQLite database file
    pub sqlite_path: Option<String>,
    /// Idle connections the pool tries to keep open
    pub pool_size: u32,
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Seconds to wait for a free connection
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: Some(DEFAULT_SQLITE_PATH.to_string()),
            pool_size: 5,
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

/// Read a variable, falling back to `default` when unset or unparsable
fn env_or<T: FromStr + fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl DatabaseConfig {
    /// Build the configuration from `DB_*` environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let db_type = env::var("DB_TYPE")
            .map(|raw| raw.parse::<DatabaseType>())
            .unwrap_or(Ok(DatabaseType::Sqlite))?;

        let sqlite_path = env::var("DB_SQLITE_PATH").ok();
        if sqlite_path.is_none() {
            info!("No DB_SQLITE_PATH provided, will use default path: {}", DEFAULT_SQLITE_PATH);
        }

        let config = DatabaseConfig {
            db_type,
            sqlite_path,
            pool_size: env_or("DB_POOL_SIZE", 10),
            max_connections: env_or("DB_MAX_CONNECTIONS", 20),
            timeout_seconds: env_or("DB_TIMEOUT_SECONDS", 30),
        };

        info!(
            "Database configuration: pool_size={}, max_connections={}, timeout={}s",
            config.pool_size, config.max_connections, config.timeout_seconds
        );

        Ok(config)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Initialize the global pool from the environment and run migrations
pub fn initialize_database_pool() -> Result<(), DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;
    let pool = match config.db_type {
        DatabaseType::Sqlite => create_sqlite_pool(&config)?,
    };

    run_migrations(&pool)?;

    DB_POOL.set(pool).map_err(|_| DatabaseError::PoolAlreadyInitialized)
}

/// Get the global database pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

/// File-backed pool, or an in-memory one when the file cannot be opened
fn create_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    let sqlite_path = config.sqlite_path.as_deref().unwrap_or(DEFAULT_SQLITE_PATH);
    info!("Initializing SQLite database at: {}", sqlite_path);

    if let Some(parent) = Path::new(sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create {:?}: {}, falling back to in-memory database", parent, e);
                return create_in_memory_pool(config);
            }
        }
    }

    let manager = SqliteConnectionManager::file(sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    let built = r2d2::Pool::builder()
        .max_size(config.max_connections.max(1))
        .min_idle(Some(config.pool_size.min(config.max_connections)))
        .connection_timeout(config.timeout())
        .build(manager);

    match built {
        Ok(pool) => Ok(DatabasePool::SQLite(Arc::new(pool))),
        Err(e) => {
            error!("Failed to create SQLite connection pool: {}", e);
            warn!("Falling back to in-memory SQLite database");
            create_in_memory_pool(config)
        },
    }
}

/// Create a pool over a single shared in-memory SQLite database.
///
/// Every connection of a `:memory:` manager would see its own empty database,
/// so the pool is capped at one connection.
pub fn create_in_memory_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(config.timeout())
        .build(SqliteConnectionManager::memory())?;

    Ok(DatabasePool::SQLite(Arc::new(pool)))
}

/// Create the schema on a pool
pub fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    match pool {
        DatabasePool::SQLite(pool) => {
            let conn = pool.get()?;
            run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;
        },
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Snapshot of the global pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Database file, or "in-memory"
    pub location: String,
    pub connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
}

impl ConnectionInfo {
    /// Every connection is open and busy
    pub fn is_saturated(&self) -> bool {
        self.idle_connections == 0 && self.connections >= self.max_connections
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SQLite {} (connections: active={}, idle={}, max={})",
            self.location, self.connections, self.idle_connections, self.max_connections
        )
    }
}

/// Check out a connection from the global pool and describe it
pub fn get_connection_info() -> Result<ConnectionInfo, DatabaseError> {
    let DatabasePool::SQLite(pool) = DB_POOL.get().ok_or(DatabaseError::PoolNotInitialized)?;
    let conn = pool.get()?;

    let location = match conn.query_row("PRAGMA database_list", [], |row| row.get::<_, String>(2)) {
        Ok(path) if path.is_empty() || path == ":memory:" => "in-memory".to_string(),
        Ok(path) => path,
        Err(_) => "unknown".to_string(),
    };
    // Counted with the checked-out connection released
    drop(conn);

    let state = pool.state();
    Ok(ConnectionInfo {
        location,
        connections: state.connections,
        idle_connections: state.idle_connections,
        max_connections: pool.max_size(),
    })
}
