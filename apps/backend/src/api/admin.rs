//! Moment authoring endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::api::{DataResponse, SuccessResponse};
use crate::blocking::with_conn;
use crate::db::models::{Moment, MomentComment, MomentUpdate, NewComment, NewMoment};
use crate::error::Result;
use crate::services::moments;
use crate::AppState;

// =============================================================================
// Router
// =============================================================================

/// Create the admin router, nested under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/moments", get(list_all_moments).post(create_moment))
        .route("/moments/:id", put(update_moment).delete(delete_moment))
        .route("/moments/:id/comments", post(add_comment))
        .route("/moments/:id/comments/:comment_id", delete(delete_comment))
}

// =============================================================================
// Moment Handlers
// =============================================================================

/// GET /api/admin/moments
///
/// Every moment, newest first, without filters or pagination.
pub async fn list_all_moments(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Moment>>>> {
    let all = with_conn(&state.db, |conn| moments::list_all_moments(conn)).await?;
    Ok(Json(DataResponse::new(all)))
}

/// POST /api/admin/moments
pub async fn create_moment(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewMoment>, JsonRejection>,
) -> Result<Json<DataResponse<Moment>>> {
    let Json(body) = body?;
    let moment = with_conn(&state.db, move |conn| moments::create_moment(conn, body)).await?;
    Ok(Json(DataResponse::new(moment)))
}

/// PUT /api/admin/moments/:id
pub async fn update_moment(
    State(state): State<AppState>,
    Path(moment_id): Path<String>,
    body: std::result::Result<Json<MomentUpdate>, JsonRejection>,
) -> Result<Json<DataResponse<Moment>>> {
    let Json(body) = body?;
    let moment = with_conn(&state.db, move |conn| {
        moments::update_moment(conn, &moment_id, body)
    })
    .await?;
    Ok(Json(DataResponse::new(moment)))
}

/// DELETE /api/admin/moments/:id
pub async fn delete_moment(
    State(state): State<AppState>,
    Path(moment_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    with_conn(&state.db, move |conn| moments::delete_moment(conn, &moment_id)).await?;
    Ok(Json(SuccessResponse::new("Moment deleted")))
}

// =============================================================================
// Comment Handlers
// =============================================================================

/// POST /api/admin/moments/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Path(moment_id): Path<String>,
    body: std::result::Result<Json<NewComment>, JsonRejection>,
) -> Result<Json<DataResponse<MomentComment>>> {
    let Json(body) = body?;
    let comment = with_conn(&state.db, move |conn| {
        moments::add_comment(conn, &moment_id, body)
    })
    .await?;
    Ok(Json(DataResponse::new(comment)))
}

/// DELETE /api/admin/moments/:id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((moment_id, comment_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>> {
    with_conn(&state.db, move |conn| {
        moments::delete_comment(conn, &moment_id, &comment_id)
    })
    .await?;
    Ok(Json(SuccessResponse::new("Comment deleted")))
}
