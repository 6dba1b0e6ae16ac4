//! # sv-api
//!
//! The web routing and orchestration layer for Snipvote.

pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::web;

/// Configures the routes for the snippet gallery.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // A random snippet, optionally excluding the previous one (?p=<id>)
            .route("/", web::get().to(handlers::index))
            // The submission flow
            .route("/post/submit", web::get().to(handlers::submit_page))
            .route("/post/submit", web::post().to(handlers::submit))
            // Judgment
            .route("/post/{post_id}/vote", web::post().to(handlers::vote))
            // Improvement suggestions
            .route("/post/{post_id}/suggest", web::get().to(handlers::suggest_page))
            .route("/post/{post_id}/suggest", web::post().to(handlers::suggest))
            .route(
                "/post/{post_id}/suggestions",
                web::get().to(handlers::list_suggestions),
            )
            .route(
                "/post/{post_id}/suggestions/{suggestion_id}",
                web::get().to(handlers::suggestion_detail),
            ),
    );
}
