//! Application services for the music API.
//!
//! Everything here is synchronous and operates on a borrowed rusqlite
//! connection; the HTTP layer moves calls onto the blocking pool.

pub mod filter;
pub mod migrator;
pub mod moments;
pub mod pagination;
pub mod songs;

pub use filter::MomentFilter;
pub use migrator::{migrate_duplicate_moments, MigrationReport};
pub use pagination::{Page, PageRequest};
