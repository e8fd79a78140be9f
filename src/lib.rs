use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod views;

// Routers grouped by access tier (public, signed-in, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and the
/// `ToSchema` models, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_home, handlers::get_advertisements, handlers::get_categories,
        handlers::sign_out, handlers::get_dashboard, handlers::get_my_ads,
        handlers::create_my_ad, handlers::request_image_upload,
        handlers::get_admin_dashboard, handlers::update_advertisement_status,
        handlers::get_admin_categories, handlers::create_category
    ),
    components(
        schemas(
            models::Role, models::AdStatus, models::ModerationDecision, models::Profile,
            models::Advertisement, models::Category, models::AdvertisementCard,
            models::CreateAdvertisementRequest, models::StatusUpdateRequest,
            models::CreateCategoryRequest, models::ImageUploadRequest,
            models::ImageUploadResponse, models::HomePage, models::DashboardView,
            models::ErrorBody,
        )
    ),
    tags(
        (name = "adboard", description = "Advertisement marketplace API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Backend data access (profiles, advertisements, categories).
    pub repo: RepositoryState,
    /// Object storage for advertisement images.
    pub storage: StorageState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the route tiers, the OpenAPI UI, and the request-id / tracing / CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Signed-in screens: the SignedIn extractor redirects anonymous viewers to login.
        .merge(authenticated::authenticated_routes())
        // Admin screens: the AdminViewer extractor redirects to login or the dashboard.
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the `http_request` span for each request so every log line carries the
/// method, URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
