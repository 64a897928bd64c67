//! Helpers for running rusqlite work from async handlers.
//!
//! rusqlite is synchronous, so every store call is moved onto Tokio's
//! blocking pool together with a connection checked out of the pool. The
//! connection goes back to the pool when the closure returns, whatever the
//! outcome.

use rusqlite::Connection;
use tokio::task::spawn_blocking;

use crate::db::DbPool;
use crate::error::{AppError, Result};

/// Run `f` on the blocking pool with a pooled connection.
///
/// # Example
/// ```ignore
/// let moment = with_conn(&state.db, move |conn| moments::get_moment(conn, &id)).await?;
/// ```
pub async fn with_conn<T, F>(pool: &DbPool, f: F) -> Result<T>
where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await
    .map_err(|e| {
        tracing::error!("Join error: {}", e);
        AppError::Internal("Background task failed".to_string())
    })?
}
