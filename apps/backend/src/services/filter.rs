//! Post-fetch filtering for moment listings.
//!
//! Tags are stored as a serialized list, so tag membership (and, for
//! symmetry, year and period membership) is evaluated here after the rows
//! come back from SQLite. Energy level is a plain column and stays in SQL.

use std::collections::HashSet;

use crate::db::models::MomentRow;
use crate::error::{AppError, Result};

/// User-supplied filter criteria. An empty set disables that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MomentFilter {
    pub tags: HashSet<String>,
    pub years: HashSet<i32>,
    pub periods: HashSet<String>,
}

impl MomentFilter {
    /// Parse comma-separated query values.
    ///
    /// Tokens are trimmed and empty tokens dropped. A year token that is not
    /// an integer is rejected.
    pub fn parse(tags: Option<&str>, years: Option<&str>, periods: Option<&str>) -> Result<Self> {
        let years = split_list(years)
            .map(|token| {
                token
                    .parse::<i32>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid year: {}", token)))
            })
            .collect::<Result<HashSet<_>>>()?;

        Ok(Self {
            tags: split_list(tags).map(str::to_string).collect(),
            years,
            periods: split_list(periods).map(str::to_string).collect(),
        })
    }

    /// True when no dimension is active.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.years.is_empty() && self.periods.is_empty()
    }

    /// Whether a moment passes every active dimension.
    ///
    /// Tags match if any of the moment's tags is selected; year and period
    /// must be members of their sets. A missing year or period never matches
    /// an active filter.
    pub fn matches(&self, row: &MomentRow) -> bool {
        if !self.tags.is_empty() && !row.tags.iter().any(|tag| self.tags.contains(tag)) {
            return false;
        }

        if !self.years.is_empty() {
            match row.first_heard_year {
                Some(year) if self.years.contains(&year) => {}
                _ => return false,
            }
        }

        if !self.periods.is_empty() {
            match row.first_heard_period.as_deref() {
                Some(period) if self.periods.contains(period) => {}
                _ => return false,
            }
        }

        true
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
