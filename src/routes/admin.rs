use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Moderation and category management, nested under `/admin`. Handlers take the
/// `AdminViewer` extractor: no session redirects to `/auth/login`, a non-admin profile
/// redirects to `/dashboard`. The extracted `AdminToken` is what the repository's
/// privileged operations require.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/dashboard
        // Every advertisement regardless of status, newest first.
        .route("/dashboard", get(handlers::get_admin_dashboard))
        // POST /admin/advertisements/{id}/status
        // Approve or reject a pending advertisement; answers with the re-fetched list.
        .route(
            "/advertisements/{id}/status",
            post(handlers::update_advertisement_status),
        )
        // GET/POST /admin/categories
        // List categories by name; add one (blank names are ignored).
        .route(
            "/categories",
            get(handlers::get_admin_categories).post(handlers::create_category),
        )
}
