use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Routes open to anonymous visitors. Every advertisement read here goes through an
/// approved-only filter; nothing pending or rejected is reachable from this module.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Landing screen: approved advertisements and the category list, read together.
        .route("/", get(handlers::get_home))
        // GET /advertisements?category=all|<uuid>
        // Category filter. Each selection is a fresh approved-only query.
        .route("/advertisements", get(handlers::get_advertisements))
        // GET /categories
        .route("/categories", get(handlers::get_categories))
        // POST /auth/signout
        // Revokes the session (if any) and redirects to the login screen.
        .route("/auth/signout", post(handlers::sign_out))
}
