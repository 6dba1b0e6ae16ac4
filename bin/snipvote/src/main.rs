//! # Snipvote Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{web, App, HttpServer};
use std::time::Duration;
use sv_api::handlers::AppState;

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use sv_db_sqlite::SqliteSnipRepo;

#[cfg(feature = "limiter-memory")]
use sv_limiter_memory::MemoryRateGate;

#[cfg(feature = "lint-python")]
use sv_lint_python::PythonLinter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:snipvote.db".into());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let rate_per_second: u32 = std::env::var("RATE_LIMIT_PER_SECOND")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(5);

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteSnipRepo::new(&database_url)
        .await
        .expect("Failed to init SQLite");

    // 2. Initialize Snippet Linter Implementation
    #[cfg(feature = "lint-python")]
    let linter = PythonLinter;

    // 3. Initialize Rate Limiter Implementation
    #[cfg(feature = "limiter-memory")]
    let gate = MemoryRateGate::new(rate_per_second, Duration::from_secs(1));

    // 4. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        linter: Box::new(linter),
        gate: Box::new(gate),
    });

    // Session cookies survive restarts only when a secret is configured
    let session_key = match std::env::var("SESSION_SECRET") {
        Ok(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
        _ => Key::generate(),
    };

    log::info!("🚀 Snipvote starting on http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(sv_api::middleware::standard_middleware())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                session_key.clone(),
            ))
            .configure(sv_api::configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
