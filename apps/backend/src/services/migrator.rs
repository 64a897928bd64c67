//! One-shot collapse of duplicate per-song moments.
//!
//! For every song with more than one moment, the earliest moment survives and
//! every later one becomes a comment on it, keeping its content and original
//! timestamp. Each song is converted in its own transaction, so an
//! interrupted run leaves every song either fully converted or untouched.
//! Running again after completion changes nothing.

use std::collections::BTreeMap;

use rusqlite::{Connection, TransactionBehavior};

use crate::error::{AppError, Result};

/// A moment as seen by the migrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MomentStub {
    pub id: String,
    pub content: String,
    pub created_at: Option<String>,
}

/// Moments sharing one song, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub song_id: String,
    pub moments: Vec<MomentStub>,
}

impl DuplicateGroup {
    /// The moment that is kept.
    pub fn survivor(&self) -> &MomentStub {
        &self.moments[0]
    }

    /// The moments that become comments, oldest first.
    pub fn duplicates(&self) -> &[MomentStub] {
        &self.moments[1..]
    }
}

/// Totals from one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Songs that had more than one moment.
    pub groups: usize,
    /// Moments converted into comments.
    pub converted: usize,
    /// Existing comments moved from a removed moment onto its survivor.
    pub reparented: usize,
}

/// Find every song with more than one moment.
///
/// Groups are ordered by song id; moments within a group by `createdAt`
/// ascending, then id. A missing timestamp sorts first, as it does in SQLite.
pub fn find_duplicate_groups(conn: &Connection) -> Result<Vec<DuplicateGroup>> {
    let mut stmt = conn.prepare("SELECT id, songId, content, createdAt FROM music_moments")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                MomentStub {
                    id: row.get(0)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                },
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut by_song: BTreeMap<String, Vec<MomentStub>> = BTreeMap::new();
    for (song_id, stub) in rows {
        by_song.entry(song_id).or_default().push(stub);
    }

    Ok(by_song
        .into_iter()
        .filter(|(_, moments)| moments.len() > 1)
        .map(|(song_id, mut moments)| {
            moments.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            DuplicateGroup { song_id, moments }
        })
        .collect())
}

/// Convert one group atomically. Returns `(converted, reparented)`.
pub fn collapse_group(conn: &mut Connection, group: &DuplicateGroup) -> Result<(usize, usize)> {
    let survivor = group.survivor();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut reparented = 0;

    for duplicate in group.duplicates() {
        let comment_id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            r#"
            INSERT INTO moment_comments (id, momentId, content, listenDate, location, createdAt)
            VALUES (?1, ?2, ?3, NULL, NULL, ?4)
            "#,
            rusqlite::params![comment_id, survivor.id, duplicate.content, duplicate.created_at],
        )?;

        // Deleting the moment would cascade to its own thread
        reparented += tx.execute(
            "UPDATE moment_comments SET momentId = ?1 WHERE momentId = ?2",
            [&survivor.id, &duplicate.id],
        )?;

        let deleted = tx.execute("DELETE FROM music_moments WHERE id = ?1", [&duplicate.id])?;
        if deleted != 1 {
            return Err(AppError::Internal(format!(
                "Moment {} disappeared during migration of song {}",
                duplicate.id, group.song_id
            )));
        }

        tracing::debug!(
            song_id = %group.song_id,
            moment_id = %duplicate.id,
            comment_id = %comment_id,
            "Converted moment to comment"
        );
    }

    tx.commit()?;
    Ok((group.duplicates().len(), reparented))
}

/// Collapse every song's duplicate moments into comments on its earliest
/// moment.
pub fn migrate_duplicate_moments(conn: &mut Connection) -> Result<MigrationReport> {
    let groups = find_duplicate_groups(conn)?;
    let mut report = MigrationReport {
        groups: groups.len(),
        ..Default::default()
    };

    if groups.is_empty() {
        tracing::info!("No songs with duplicate moments");
        return Ok(report);
    }

    for group in &groups {
        tracing::info!(
            song_id = %group.song_id,
            moments = group.moments.len(),
            survivor = %group.survivor().id,
            "Collapsing duplicate moments"
        );

        let (converted, reparented) = collapse_group(conn, group).map_err(|e| {
            tracing::error!(song_id = %group.song_id, error = %e, "Group rolled back");
            e
        })?;
        report.converted += converted;
        report.reparented += reparented;
    }

    tracing::info!(
        groups = report.groups,
        converted = report.converted,
        reparented = report.reparented,
        "Moment migration completed"
    );

    Ok(report)
}
