use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Screens for any signed-in viewer. Each handler takes the `SignedIn` extractor, so a
/// request without a session is redirected to `/auth/login` before the handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /dashboard
        // General dashboard; also the landing spot for non-admins turned away from /admin.
        .route("/dashboard", get(handlers::get_dashboard))
        // GET/POST /dashboard/my-ads
        // The viewer's own advertisements in every status, and submission of new ones.
        .route(
            "/dashboard/my-ads",
            get(handlers::get_my_ads).post(handlers::create_my_ad),
        )
        // POST /uploads/ad-image
        // Presigned PUT URL for an advertisement image (10 minutes, image/* only).
        .route("/uploads/ad-image", post(handlers::request_image_upload))
}
