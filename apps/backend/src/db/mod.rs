//! Database module for the music API.
//!
//! Provides the connection pool, schema migrations, and models.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

pub mod models;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("src/db/migrations");
}

/// Pool of SQLite connections handed out per request.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of the pool; returned on drop.
pub type DbConn = PooledConnection<SqliteConnectionManager>;

#[derive(Debug)]
pub enum DbError {
    Connection(rusqlite::Error),
    Pool(r2d2::Error),
    Migration(refinery::Error),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Connection(e) => write!(f, "Database connection error: {}", e),
            DbError::Pool(e) => write!(f, "Connection pool error: {}", e),
            DbError::Migration(e) => write!(f, "Migration error: {}", e),
        }
    }
}

impl std::error::Error for DbError {}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        DbError::Connection(err)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(err: r2d2::Error) -> Self {
        DbError::Pool(err)
    }
}

impl From<refinery::Error> for DbError {
    fn from(err: refinery::Error) -> Self {
        DbError::Migration(err)
    }
}

/// Configure connection with recommended pragmas
fn configure_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
}

fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    let mut conn = pool.get()?;
    embedded::migrations::runner().run(&mut *conn)?;
    Ok(())
}

/// Open a pooled database at `db_path` and run migrations.
pub fn init_pool<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<DbPool, DbError> {
    let manager = SqliteConnectionManager::file(db_path).with_init(configure_connection);
    let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Initialize an in-memory database (useful for testing).
///
/// Every SQLite in-memory connection is its own database, so the pool holds
/// exactly one connection that is never recycled.
pub fn init_pool_memory() -> Result<DbPool, DbError> {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Current time as an RFC 3339 UTC string with microsecond precision.
///
/// All timestamps written by the service use this format so that they sort
/// lexicographically among themselves. Naive local timestamps already in an
/// imported database are left as they are and do not interleave exactly with
/// these.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
