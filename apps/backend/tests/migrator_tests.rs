//! End-to-end tests for the duplicate moment migration against a file-backed
//! database, checked through the HTTP API afterwards.

use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use music_api::config::Config;
use music_api::db::{self, DbPool};
use music_api::services::{migrate_duplicate_moments, MigrationReport};
use music_api::{build_router, AppState};

fn seeded_pool(dir: &TempDir) -> DbPool {
    let pool = db::init_pool(dir.path().join("music.db"), 2).expect("Failed to open database");
    pool.get()
        .unwrap()
        .execute_batch(
            r#"
            INSERT INTO artists (id, name) VALUES ('ar1', 'Hiroshi Yoshimura');
            INSERT INTO songs (id, title, artistId) VALUES ('S', 'Creek', 'ar1');
            INSERT INTO songs (id, title, artistId) VALUES ('T', 'Blink', 'ar1');
            INSERT INTO music_moments (id, songId, content, tags, createdAt, updatedAt)
                VALUES ('M2', 'S', 'b', '[]', '2024-02-01T00:00:00Z', '2024-02-01T00:00:00Z');
            INSERT INTO music_moments (id, songId, content, tags, createdAt, updatedAt)
                VALUES ('M1', 'S', 'a', '["dawn"]', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z');
            INSERT INTO music_moments (id, songId, content, tags, createdAt, updatedAt)
                VALUES ('M3', 'S', 'c', '[]', '2024-03-01T00:00:00Z', '2024-03-01T00:00:00Z');
            INSERT INTO music_moments (id, songId, content, tags, createdAt, updatedAt)
                VALUES ('N1', 'T', 'only', '[]', '2024-01-15T00:00:00Z', '2024-01-15T00:00:00Z');
            "#,
        )
        .unwrap();
    pool
}

#[tokio::test]
async fn test_migration_collapses_duplicates_end_to_end() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir);

    let report = {
        let mut conn = pool.get().unwrap();
        migrate_duplicate_moments(&mut conn).unwrap()
    };
    assert_eq!(
        report,
        MigrationReport {
            groups: 1,
            converted: 2,
            reparented: 0,
        }
    );

    let server = TestServer::new(build_router(AppState::new(Config::default(), pool))).unwrap();

    let body: serde_json::Value = server.get("/api/moments").await.json();
    assert_eq!(body["total"], 2);

    let response = server.get("/api/songs/S/moment").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let moment = &body["data"];
    assert_eq!(moment["id"], "M1");
    assert_eq!(moment["content"], "a");
    assert_eq!(moment["tags"], json!(["dawn"]));

    let comments: Vec<(&str, &str)> = moment["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c["content"].as_str().unwrap(), c["createdAt"].as_str().unwrap()))
        .collect();
    assert_eq!(
        comments,
        vec![("b", "2024-02-01T00:00:00Z"), ("c", "2024-03-01T00:00:00Z")]
    );

    server.get("/api/moments/M2").await.assert_status_not_found();
    server.get("/api/moments/N1").await.assert_status_ok();
}

#[test]
fn test_migration_survives_reopen_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    {
        let pool = seeded_pool(&dir);
        let mut conn = pool.get().unwrap();
        assert_eq!(migrate_duplicate_moments(&mut conn).unwrap().converted, 2);
    }

    let pool = db::init_pool(dir.path().join("music.db"), 1).unwrap();
    let mut conn = pool.get().unwrap();

    let moments: i64 = conn
        .query_row("SELECT COUNT(*) FROM music_moments", [], |row| row.get(0))
        .unwrap();
    let comments: i64 = conn
        .query_row("SELECT COUNT(*) FROM moment_comments", [], |row| row.get(0))
        .unwrap();
    assert_eq!((moments, comments), (2, 2));

    assert_eq!(
        migrate_duplicate_moments(&mut conn).unwrap(),
        MigrationReport::default()
    );
}
