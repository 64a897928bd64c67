//! API endpoint handlers for the music API.

use serde::Serialize;

use crate::services::Page;

pub mod admin;
pub mod moments;
pub mod songs;

// =============================================================================
// Response Envelopes
// =============================================================================

/// `{success, data}` wrapper used by most endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Paginated list wrapper; metadata describes the whole filtered set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub success: bool,
    /// Items in the current page.
    pub data: Vec<T>,
    /// Total number of items across all pages.
    pub total: usize,
    /// Current page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total number of pages; at least 1.
    pub total_pages: u32,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            data: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

/// Generic success response for operations with nothing to return.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
