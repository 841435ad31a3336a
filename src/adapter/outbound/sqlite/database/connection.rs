//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support, and connection
//! configuration for SQLite databases.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a statement waits on another writer's lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Applies pragmas to every pooled connection as it is handed out.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        configure_sqlite_connection(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a connection pool for the given database URL.
///
/// `connection_timeout` bounds how long a caller waits for a free
/// connection, which keeps enqueue fail-fast when the database is busy.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(
    database_url: &str,
    max_size: u32,
    connection_timeout: Duration,
) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size.max(1))
        .connection_timeout(connection_timeout)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Connection(e.to_string()))?;
    Ok(())
}

/// Configure SQLite connection pragmas used for concurrent writers.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_sqlite_connection(conn: &mut SqliteConnection) -> QueryResult<()> {
    diesel::sql_query(format!("PRAGMA busy_timeout={}", BUSY_TIMEOUT.as_millis())).execute(conn)?;
    diesel::sql_query("PRAGMA journal_mode=WAL").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL").execute(conn)?;
    Ok(())
}

/// Run blocking Diesel work on a pooled connection off the async runtime.
///
/// # Errors
/// Returns [`Error::Connection`] if no connection is available and whatever
/// `work` returns otherwise.
pub async fn interact<T, F>(pool: &DbPool, work: F) -> Result<T>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        work(&mut conn)
    })
    .await
    .map_err(|e| Error::Database(e.to_string()))?
}

/// Fixed-width timestamp so stored values compare correctly as text.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// # Errors
/// Returns [`Error::Parse`] for malformed values.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("invalid timestamp '{value}': {e}")))
}
