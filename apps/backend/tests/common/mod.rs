//! Test infrastructure for music API integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` backed by an
//! in-memory database, plus helpers for seeding artists, songs, moments and
//! comments directly through SQL.

#![allow(dead_code)]

use axum_test::TestServer;

use music_api::config::Config;
use music_api::db::{self, DbConn, DbPool};
use music_api::{build_router, AppState};

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    db: DbPool,
}

impl TestApp {
    /// Create a new test application with an in-memory database and the
    /// production router.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a test application with a custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let db = db::init_pool_memory().expect("Failed to initialize test database");
        let app = build_router(AppState::new(config, db.clone()));
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, db }
    }

    /// Get a reference to the test server.
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Check out the database connection.
    ///
    /// The in-memory pool holds a single connection; drop the guard before
    /// issuing a request.
    pub fn db(&self) -> DbConn {
        self.db.get().expect("Failed to check out test connection")
    }

    /// Run raw SQL against the test database.
    pub fn exec(&self, sql: &str) {
        self.db().execute_batch(sql).expect("Failed to run SQL");
    }

    pub fn seed_artist(&self, id: &str, name: &str) {
        self.db()
            .execute(
                "INSERT INTO artists (id, name) VALUES (?1, ?2)",
                [id, name],
            )
            .expect("Failed to seed artist");
    }

    pub fn seed_song(&self, id: &str, title: &str, artist_id: &str, cover_url: Option<&str>) {
        self.db()
            .execute(
                "INSERT INTO songs (id, title, artistId, coverUrl) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, title, artist_id, cover_url],
            )
            .expect("Failed to seed song");
    }

    /// Insert a moment with the given tags; other optional fields stay NULL.
    pub fn seed_moment(&self, id: &str, song_id: &str, tags: &[&str], created_at: &str) {
        let tags = serde_json::to_string(tags).expect("Failed to encode tags");
        self.db()
            .execute(
                r#"
                INSERT INTO music_moments (id, songId, content, tags, energyLevel, likeCount, createdAt, updatedAt)
                VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?5)
                "#,
                rusqlite::params![id, song_id, format!("moment {}", id), tags, created_at],
            )
            .expect("Failed to seed moment");
    }

    pub fn seed_comment(&self, id: &str, moment_id: &str, content: &str, created_at: &str) {
        self.db()
            .execute(
                "INSERT INTO moment_comments (id, momentId, content, createdAt) VALUES (?1, ?2, ?3, ?4)",
                [id, moment_id, content, created_at],
            )
            .expect("Failed to seed comment");
    }

    /// One artist (`ar1`) with two songs (`s1`, `s2`).
    pub fn seed_catalog(&self) {
        self.seed_artist("ar1", "Nujabes");
        self.seed_song("s1", "Aruarian Dance", "ar1", Some("http://img.example/s1.jpg"));
        self.seed_song("s2", "Feather", "ar1", None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new().await;
        let count: i64 = app
            .db()
            .query_row("SELECT COUNT(*) FROM music_moments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_health_check_endpoint() {
        let app = TestApp::new().await;
        let response = app.server().get("/health").await;

        response.assert_status_ok();
        response.assert_json_contains(&serde_json::json!({
            "message": "Music API is running"
        }));
    }
}
