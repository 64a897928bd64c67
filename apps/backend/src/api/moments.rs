//! Public moment endpoints: listing, detail, likes and filter values.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::{DataResponse, PaginatedResponse};
use crate::blocking::with_conn;
use crate::db::models::{LikeResult, Moment};
use crate::error::Result;
use crate::services::{moments, MomentFilter, PageRequest};
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for listing moments.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMomentsQuery {
    /// Page number (1-indexed, default: 1).
    pub page: Option<i64>,
    /// Items per page (default: 20, max: 100).
    pub limit: Option<i64>,
    /// Comma-separated tags; a moment matches if it has any of them.
    pub tags: Option<String>,
    /// Exact energy level.
    pub energy_level: Option<i32>,
    /// Comma-separated first-heard years.
    pub year: Option<String>,
    /// Comma-separated first-heard periods.
    pub period: Option<String>,
}

// =============================================================================
// Router
// =============================================================================

/// Create the moments router, nested under `/api/moments`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_moments))
        .route("/filters/tags", get(list_tags))
        .route("/filters/years", get(list_years))
        .route("/filters/periods", get(list_periods))
        .route("/:id", get(get_moment))
        .route("/:id/like", post(like_moment))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/moments
///
/// Filter, then paginate. Parameters are validated before the database is
/// touched; malformed numbers are reported in the usual error body.
pub async fn list_moments(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListMomentsQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Moment>>> {
    let Query(query) = query?;
    let request = PageRequest::from_query(query.page, query.limit, &state.config.moments)?;
    let filter = MomentFilter::parse(
        query.tags.as_deref(),
        query.year.as_deref(),
        query.period.as_deref(),
    )?;
    let energy_level = query.energy_level;

    let page = with_conn(&state.db, move |conn| {
        moments::list_moments(conn, &filter, energy_level, request)
    })
    .await?;

    Ok(Json(page.into()))
}

/// GET /api/moments/:id
///
/// Returns the moment itself, not wrapped in an envelope.
pub async fn get_moment(
    State(state): State<AppState>,
    Path(moment_id): Path<String>,
) -> Result<Json<Moment>> {
    let moment = with_conn(&state.db, move |conn| moments::get_moment(conn, &moment_id)).await?;
    Ok(Json(moment))
}

/// POST /api/moments/:id/like
pub async fn like_moment(
    State(state): State<AppState>,
    Path(moment_id): Path<String>,
) -> Result<Json<DataResponse<LikeResult>>> {
    let result = with_conn(&state.db, move |conn| moments::like_moment(conn, &moment_id)).await?;
    Ok(Json(DataResponse::new(result)))
}

/// GET /api/moments/filters/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<DataResponse<Vec<String>>>> {
    let tags = with_conn(&state.db, |conn| moments::distinct_tags(conn)).await?;
    Ok(Json(DataResponse::new(tags)))
}

/// GET /api/moments/filters/years
pub async fn list_years(State(state): State<AppState>) -> Result<Json<DataResponse<Vec<i32>>>> {
    let years = with_conn(&state.db, |conn| moments::distinct_years(conn)).await?;
    Ok(Json(DataResponse::new(years)))
}

/// GET /api/moments/filters/periods
pub async fn list_periods(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<String>>>> {
    let periods = with_conn(&state.db, |conn| moments::distinct_periods(conn)).await?;
    Ok(Json(DataResponse::new(periods)))
}
