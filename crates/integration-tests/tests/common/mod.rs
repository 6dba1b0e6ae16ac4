//! Shared fixtures for the API surface tests.

use actix_web::web;
use chrono::Utc;
use std::time::Duration;
use sv_api::handlers::AppState;
use sv_core::models::Post;
use sv_db_sqlite::SqliteSnipRepo;
use sv_limiter_memory::MemoryRateGate;
use sv_lint_python::PythonLinter;
use uuid::Uuid;

/// Fresh in-memory application state. `permits` bounds each route group's
/// per-window budget; functional tests pass a high number so they never
/// trip the limiter.
pub async fn state(permits: u32) -> web::Data<AppState> {
    let repo = SqliteSnipRepo::new("sqlite::memory:").await.unwrap();
    web::Data::new(AppState {
        repo: Box::new(repo),
        linter: Box::new(PythonLinter),
        gate: Box::new(MemoryRateGate::new(permits, Duration::from_secs(1))),
    })
}

#[allow(dead_code)]
pub fn post_fixture(title: &str) -> Post {
    Post {
        id: Uuid::now_v7(),
        title: title.to_string(),
        code: "def f(): pass".to_string(),
        note: None,
        submitter_id: None,
        created_at: Utc::now(),
    }
}
