use serde::{Deserialize, Serialize};

/// Denormalized song/artist summary attached to every moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub cover_url: Option<String>,
    pub artist_name: String,
}

/// A reply in a moment's thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentComment {
    pub id: String,
    pub moment_id: String,
    pub content: String,
    pub listen_date: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<String>,
}

/// A fully hydrated moment as returned over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    pub id: String,
    pub song_id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub energy_level: Option<i32>,
    pub first_heard_year: Option<i32>,
    pub first_heard_period: Option<String>,
    pub like_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub song: SongSummary,
    pub comments: Vec<MomentComment>,
}

/// A `music_moments` row joined with its song and artist, before comments
/// are attached.
///
/// `song` is `None` when the owning song or its artist no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentRow {
    pub id: String,
    pub song_id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub energy_level: Option<i32>,
    pub first_heard_year: Option<i32>,
    pub first_heard_period: Option<String>,
    pub like_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub song: Option<SongSummary>,
}

impl MomentRow {
    /// Attach a song summary and comment thread.
    ///
    /// Returns `None` if the row has no resolvable song.
    pub fn into_moment(self, comments: Vec<MomentComment>) -> Option<Moment> {
        let song = self.song?;
        Some(Moment {
            id: self.id,
            song_id: self.song_id,
            content: self.content,
            tags: self.tags,
            energy_level: self.energy_level,
            first_heard_year: self.first_heard_year,
            first_heard_period: self.first_heard_period,
            like_count: self.like_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            song,
            comments,
        })
    }
}

/// Result of a like operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResult {
    pub moment_id: String,
    pub like_count: i64,
}

/// Result of recording a song play.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResult {
    pub song_id: String,
    pub play_count: i64,
}

/// Request body for creating a moment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMoment {
    pub song_id: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub energy_level: Option<i32>,
    pub first_heard_year: Option<i32>,
    pub first_heard_period: Option<String>,
}

/// Request body for updating a moment. The song and like count are fixed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentUpdate {
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub energy_level: Option<i32>,
    pub first_heard_year: Option<i32>,
    pub first_heard_period: Option<String>,
}

/// Request body for adding a comment; the moment comes from the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub listen_date: Option<String>,
    pub location: Option<String>,
}
