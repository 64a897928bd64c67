//! Moment queries, assembly and authoring.
//!
//! All functions take a borrowed SQLite connection; callers check one out of
//! the pool per request.

use std::collections::BTreeSet;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::db::models::{
    LikeResult, Moment, MomentComment, MomentRow, MomentUpdate, NewComment, NewMoment,
    SongSummary,
};
use crate::db::now_timestamp;
use crate::error::{not_found_on_empty, AppError, Result};
use crate::services::filter::MomentFilter;
use crate::services::pagination::{paginate, Page, PageRequest};

const MOMENT_SELECT: &str = r#"
    SELECT m.id, m.songId, m.content, m.tags, m.energyLevel, m.firstHeardYear,
           m.firstHeardPeriod, m.likeCount, m.createdAt, m.updatedAt,
           s.id, s.title, s.coverUrl, ar.name
    FROM music_moments m
    LEFT JOIN songs s ON m.songId = s.id
    LEFT JOIN artists ar ON s.artistId = ar.id
"#;

/// Rewrite a plain `http://` URL to `https://`. Other values pass through.
pub fn ensure_https_url(url: Option<String>) -> Option<String> {
    url.map(|u| match u.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => u,
    })
}

/// Decode the JSON tag list stored on a moment.
///
/// Unparsable values are logged and treated as no tags.
fn parse_tags(moment_id: &str, raw: Option<String>) -> Vec<String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::warn!(moment_id, error = %e, "Ignoring malformed tags column");
            Vec::new()
        }),
    }
}

fn serialize_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| AppError::Internal(format!("Failed to encode tags: {}", e)))
}

/// Trim tags, drop empty ones and duplicates while keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Maps a joined moment row to a MomentRow.
fn map_moment_row(row: &rusqlite::Row) -> rusqlite::Result<MomentRow> {
    let id: String = row.get(0)?;
    let tags = parse_tags(&id, row.get(3)?);

    let song_id: Option<String> = row.get(10)?;
    let title: Option<String> = row.get(11)?;
    let cover_url: Option<String> = row.get(12)?;
    let artist_name: Option<String> = row.get(13)?;
    let song = match (song_id, artist_name) {
        (Some(song_id), Some(artist_name)) => Some(SongSummary {
            id: song_id,
            title: title.unwrap_or_default(),
            cover_url: ensure_https_url(cover_url),
            artist_name,
        }),
        _ => None,
    };

    Ok(MomentRow {
        id,
        song_id: row.get(1)?,
        content: row.get(2)?,
        tags,
        energy_level: row.get(4)?,
        first_heard_year: row.get(5)?,
        first_heard_period: row.get(6)?,
        like_count: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        song,
    })
}

/// Maps a database row to a MomentComment struct.
fn map_comment_row(row: &rusqlite::Row) -> rusqlite::Result<MomentComment> {
    Ok(MomentComment {
        id: row.get(0)?,
        moment_id: row.get(1)?,
        content: row.get(2)?,
        listen_date: row.get(3)?,
        location: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Comments for a moment, oldest first. Rows sharing a timestamp keep
/// insertion order.
pub fn fetch_comments(conn: &Connection, moment_id: &str) -> Result<Vec<MomentComment>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT id, momentId, content, listenDate, location, createdAt
        FROM moment_comments
        WHERE momentId = ?1
        ORDER BY createdAt ASC, rowid ASC
        "#,
    )?;

    let comments = stmt
        .query_map([moment_id], map_comment_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(comments)
}

/// Attach the comment thread to a joined row.
///
/// A row whose song or artist is gone is reported as `NotFound`.
pub fn assemble(conn: &Connection, row: MomentRow) -> Result<Moment> {
    if row.song.is_none() {
        tracing::warn!(
            moment_id = %row.id,
            song_id = %row.song_id,
            "Moment references a missing song or artist"
        );
        return Err(AppError::NotFound(format!(
            "Song {} for moment {} not found",
            row.song_id, row.id
        )));
    }

    let comments = fetch_comments(conn, &row.id)?;
    let id = row.id.clone();
    row.into_moment(comments)
        .ok_or_else(|| AppError::NotFound(format!("Song for moment {} not found", id)))
}

/// All moments newest first, optionally restricted to one energy level.
fn fetch_moment_rows(conn: &Connection, energy_level: Option<i32>) -> Result<Vec<MomentRow>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR m.energyLevel = ?1) ORDER BY m.createdAt DESC, m.rowid DESC",
        MOMENT_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([energy_level], map_moment_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Drop rows whose song or artist no longer exists, logging each one.
fn drop_orphans(rows: Vec<MomentRow>) -> impl Iterator<Item = MomentRow> {
    rows.into_iter().filter(|row| {
        if row.song.is_some() {
            return true;
        }
        tracing::warn!(
            moment_id = %row.id,
            song_id = %row.song_id,
            "Skipping moment with missing song or artist"
        );
        false
    })
}

/// Filtered, paginated and hydrated moment listing.
///
/// Filtering happens before pagination, so `total` and `total_pages`
/// describe the filtered set.
pub fn list_moments(
    conn: &Connection,
    filter: &MomentFilter,
    energy_level: Option<i32>,
    request: PageRequest,
) -> Result<Page<Moment>> {
    let rows = fetch_moment_rows(conn, energy_level)?;
    let fetched = rows.len();

    let filtered: Vec<MomentRow> = drop_orphans(rows).filter(|row| filter.matches(row)).collect();

    tracing::debug!(
        fetched,
        matched = filtered.len(),
        page = request.page,
        limit = request.limit,
        "Listing moments"
    );

    paginate(filtered, request).try_map(|row| assemble(conn, row))
}

/// Every moment, newest first, with comments. Orphaned rows are skipped.
pub fn list_all_moments(conn: &Connection) -> Result<Vec<Moment>> {
    let rows = fetch_moment_rows(conn, None)?;
    drop_orphans(rows).map(|row| assemble(conn, row)).collect()
}

/// A single hydrated moment.
pub fn get_moment(conn: &Connection, moment_id: &str) -> Result<Moment> {
    let sql = format!("{} WHERE m.id = ?1", MOMENT_SELECT);
    let row = conn
        .query_row(&sql, [moment_id], map_moment_row)
        .map_err(not_found_on_empty("Moment"))?;
    assemble(conn, row)
}

/// The newest moment for a song, if any.
pub fn get_song_moment(conn: &Connection, song_id: &str) -> Result<Option<Moment>> {
    let sql = format!(
        "{} WHERE m.songId = ?1 ORDER BY m.createdAt DESC, m.rowid DESC LIMIT 1",
        MOMENT_SELECT
    );
    let row = conn
        .query_row(&sql, [song_id], map_moment_row)
        .optional()?;

    row.map(|row| assemble(conn, row)).transpose()
}

/// Increment a moment's like counter and return the new value.
///
/// The increment and read-back are one statement, so concurrent likes never
/// overwrite each other.
pub fn like_moment(conn: &Connection, moment_id: &str) -> Result<LikeResult> {
    let like_count: i64 = conn
        .query_row(
            r#"
            UPDATE music_moments
            SET likeCount = COALESCE(likeCount, 0) + 1
            WHERE id = ?1
            RETURNING likeCount
            "#,
            [moment_id],
            |row| row.get(0),
        )
        .map_err(not_found_on_empty("Moment"))?;

    tracing::info!(moment_id, like_count, "Moment liked");

    Ok(LikeResult {
        moment_id: moment_id.to_string(),
        like_count,
    })
}

/// Distinct tags across all moments, sorted ascending.
pub fn distinct_tags(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id, tags FROM music_moments WHERE tags IS NOT NULL AND tags != '[]'",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let tags: BTreeSet<String> = rows
        .into_iter()
        .flat_map(|(id, raw)| parse_tags(&id, raw))
        .collect();
    Ok(tags.into_iter().collect())
}

/// Distinct first-heard years, ascending.
pub fn distinct_years(conn: &Connection) -> Result<Vec<i32>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT DISTINCT firstHeardYear
        FROM music_moments
        WHERE firstHeardYear IS NOT NULL
        ORDER BY firstHeardYear ASC
        "#,
    )?;
    let years = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(years)
}

/// Distinct non-empty first-heard periods, ascending.
pub fn distinct_periods(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT DISTINCT firstHeardPeriod
        FROM music_moments
        WHERE firstHeardPeriod IS NOT NULL AND firstHeardPeriod != ''
        ORDER BY firstHeardPeriod ASC
        "#,
    )?;
    let periods = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(periods)
}

fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }
    Ok(())
}

fn ensure_moment_exists(conn: &Connection, moment_id: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM music_moments WHERE id = ?1)",
        [moment_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound("Moment not found".to_string()));
    }
    Ok(())
}

/// Create the moment for a song.
///
/// A song holds at most one moment; later shares belong in its comments.
/// The existence check and the insert run under a write lock taken up front,
/// so concurrent creates for one song queue on `busy_timeout` instead of
/// failing on a stale snapshot.
pub fn create_moment(conn: &mut Connection, body: NewMoment) -> Result<Moment> {
    require_content(&body.content)?;
    let tags = serialize_tags(&normalize_tags(body.tags))?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let song_exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM songs WHERE id = ?1)",
        [&body.song_id],
        |row| row.get(0),
    )?;
    if !song_exists {
        return Err(AppError::NotFound("Song not found".to_string()));
    }

    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM music_moments WHERE songId = ?1 LIMIT 1",
            [&body.song_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(existing) = existing {
        return Err(AppError::BadRequest(format!(
            "Song already has moment {}; add a comment instead",
            existing
        )));
    }

    let moment_id = uuid::Uuid::new_v4().to_string();
    let now = now_timestamp();

    tx.execute(
        r#"
        INSERT INTO music_moments (
            id, songId, content, tags, energyLevel, firstHeardYear, firstHeardPeriod,
            likeCount, createdAt, updatedAt
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
        "#,
        rusqlite::params![
            moment_id,
            body.song_id,
            body.content,
            tags,
            body.energy_level,
            body.first_heard_year,
            body.first_heard_period,
            now,
        ],
    )?;
    tx.commit()?;

    tracing::info!(moment_id = %moment_id, song_id = %body.song_id, "Moment created");

    get_moment(conn, &moment_id)
}

/// Replace a moment's editable fields and bump `updatedAt`.
pub fn update_moment(conn: &Connection, moment_id: &str, body: MomentUpdate) -> Result<Moment> {
    require_content(&body.content)?;
    let tags = serialize_tags(&normalize_tags(body.tags))?;

    let changed = conn.execute(
        r#"
        UPDATE music_moments
        SET content = ?1, tags = ?2, energyLevel = ?3, firstHeardYear = ?4,
            firstHeardPeriod = ?5, updatedAt = ?6
        WHERE id = ?7
        "#,
        rusqlite::params![
            body.content,
            tags,
            body.energy_level,
            body.first_heard_year,
            body.first_heard_period,
            now_timestamp(),
            moment_id,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("Moment not found".to_string()));
    }

    tracing::info!(moment_id, "Moment updated");

    get_moment(conn, moment_id)
}

/// Delete a moment; its comments go with it.
pub fn delete_moment(conn: &Connection, moment_id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM music_moments WHERE id = ?1", [moment_id])?;
    if changed == 0 {
        return Err(AppError::NotFound("Moment not found".to_string()));
    }

    tracing::info!(moment_id, "Moment deleted");
    Ok(())
}

/// Append a comment to a moment's thread.
pub fn add_comment(conn: &Connection, moment_id: &str, body: NewComment) -> Result<MomentComment> {
    require_content(&body.content)?;
    ensure_moment_exists(conn, moment_id)?;

    let comment = MomentComment {
        id: uuid::Uuid::new_v4().to_string(),
        moment_id: moment_id.to_string(),
        content: body.content,
        listen_date: body.listen_date,
        location: body.location,
        created_at: Some(now_timestamp()),
    };

    conn.execute(
        r#"
        INSERT INTO moment_comments (id, momentId, content, listenDate, location, createdAt)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        rusqlite::params![
            comment.id,
            comment.moment_id,
            comment.content,
            comment.listen_date,
            comment.location,
            comment.created_at,
        ],
    )?;

    tracing::info!(moment_id, comment_id = %comment.id, "Comment added");

    Ok(comment)
}

/// Delete a comment, which must belong to the given moment.
pub fn delete_comment(conn: &Connection, moment_id: &str, comment_id: &str) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM moment_comments WHERE id = ?1 AND momentId = ?2",
        [comment_id, moment_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    tracing::info!(moment_id, comment_id, "Comment deleted");
    Ok(())
}
