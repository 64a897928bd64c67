//! Song-level mutations.

use rusqlite::Connection;

use crate::db::models::PlayResult;
use crate::error::{not_found_on_empty, Result};

/// Record one play of a song and return the new play count.
pub fn record_play(conn: &Connection, song_id: &str) -> Result<PlayResult> {
    let play_count: i64 = conn
        .query_row(
            r#"
            UPDATE songs
            SET playCount = COALESCE(playCount, 0) + 1
            WHERE id = ?1
            RETURNING playCount
            "#,
            [song_id],
            |row| row.get(0),
        )
        .map_err(not_found_on_empty("Song"))?;

    tracing::debug!(song_id, play_count, "Song play recorded");

    Ok(PlayResult {
        song_id: song_id.to_string(),
        play_count,
    })
}
