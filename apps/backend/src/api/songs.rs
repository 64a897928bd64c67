//! Song-scoped endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::DataResponse;
use crate::blocking::with_conn;
use crate::db::models::{Moment, PlayResult};
use crate::error::Result;
use crate::services::{moments, songs};
use crate::AppState;

/// Create the songs router, nested under `/api/songs`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/moment", get(get_song_moment))
        .route("/:id/play", post(record_play))
}

/// GET /api/songs/:id/moment
///
/// `data` is `null` when the song has no moment; an unknown song is not an
/// error here.
pub async fn get_song_moment(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> Result<Json<DataResponse<Option<Moment>>>> {
    let moment = with_conn(&state.db, move |conn| moments::get_song_moment(conn, &song_id)).await?;
    Ok(Json(DataResponse::new(moment)))
}

/// POST /api/songs/:id/play
pub async fn record_play(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> Result<Json<DataResponse<PlayResult>>> {
    let result = with_conn(&state.db, move |conn| songs::record_play(conn, &song_id)).await?;
    Ok(Json(DataResponse::new(result)))
}
