use crate::{
    AppState,
    auth::{self, Session},
    error::{AppError, AppResult},
    guard::{AdminViewer, LOGIN_PATH, SignedIn},
    models::{
        Advertisement, AdvertisementCard, Category, CreateAdvertisementRequest,
        CreateCategoryRequest, DashboardView, ErrorBody, HomePage, ImageUploadRequest,
        ImageUploadResponse, Role, StatusUpdateRequest,
    },
    storage,
    views::{
        advertisements, categories,
        filter::{self, CategoryFilter},
        moderation,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// AdvertisementQuery
///
/// Query parameters of the public advertisement listing (GET /advertisements).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AdvertisementQuery {
    /// `all` (default) or a category id.
    pub category: Option<String>,
}

// --- Public Handlers ---

/// get_home
///
/// [Public Route] Landing screen: approved advertisements and the category list.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing screen", body = HomePage),
        (status = 502, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn get_home(State(state): State<AppState>) -> AppResult<Json<HomePage>> {
    let page = advertisements::home_page(state.repo.as_ref()).await?;
    Ok(Json(page))
}

/// get_advertisements
///
/// [Public Route] Approved advertisements, optionally restricted to one category.
/// Every call is a fresh query.
#[utoipa::path(
    get,
    path = "/advertisements",
    params(AdvertisementQuery),
    responses(
        (status = 200, description = "Approved advertisements", body = [Advertisement]),
        (status = 400, description = "Invalid category", body = ErrorBody)
    )
)]
pub async fn get_advertisements(
    State(state): State<AppState>,
    Query(query): Query<AdvertisementQuery>,
) -> AppResult<Json<Vec<Advertisement>>> {
    let selection = match query.category.as_deref() {
        Some(raw) => raw.parse::<CategoryFilter>().map_err(AppError::BadRequest)?,
        None => CategoryFilter::default(),
    };
    let ads = filter::apply(state.repo.as_ref(), selection).await?;
    Ok(Json(ads))
}

/// get_categories
///
/// [Public Route] Categories by name, for the filter selector.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(categories::list(state.repo.as_ref()).await?))
}

/// sign_out
///
/// [Public Route] Ends the session at the auth subsystem and sends the viewer to the
/// login screen. Revocation failures are logged and do not block the redirect.
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses((status = 303, description = "Redirect to login"))
)]
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    if let Some(session) = Session::from_headers(&headers, &state.config) {
        if let Err(e) = auth::sign_out(&state.config, &session).await {
            tracing::warn!(user = %session.user_id, error = %e, "sign-out not acknowledged");
        }
    }
    Redirect::to(LOGIN_PATH)
}

// --- Signed-in Handlers ---

/// get_dashboard
///
/// [Authenticated Route] General dashboard. A missing or unreadable profile reads as
/// role `user`.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardView),
        (status = 303, description = "Redirect to login")
    )
)]
pub async fn get_dashboard(
    SignedIn(session): SignedIn,
    State(state): State<AppState>,
) -> Json<DashboardView> {
    let role = match state.repo.get_profile(session.user_id).await {
        Ok(profile) => profile.map(|profile| profile.role).unwrap_or_default(),
        Err(e) => {
            // Same fall-through as the guard: an unreadable profile is a regular user.
            tracing::warn!(user = %session.user_id, error = %e, "profile lookup failed");
            Role::User
        }
    };

    Json(DashboardView {
        user_id: session.user_id,
        role,
        is_admin: role == Role::Admin,
    })
}

/// get_my_ads
///
/// [Authenticated Route] The viewer's own advertisements in every status.
#[utoipa::path(
    get,
    path = "/dashboard/my-ads",
    responses(
        (status = 200, description = "My advertisements", body = [AdvertisementCard]),
        (status = 303, description = "Redirect to login")
    )
)]
pub async fn get_my_ads(
    SignedIn(session): SignedIn,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdvertisementCard>>> {
    let ads = advertisements::owner_feed(state.repo.as_ref(), Some(&session)).await?;
    Ok(Json(ads))
}

/// create_my_ad
///
/// [Authenticated Route] Submits a new advertisement. It starts `pending` and is owned
/// by the session's identity.
#[utoipa::path(
    post,
    path = "/dashboard/my-ads",
    request_body = CreateAdvertisementRequest,
    responses(
        (status = 201, description = "Submitted", body = Advertisement),
        (status = 400, description = "Blank title or description", body = ErrorBody),
        (status = 303, description = "Redirect to login")
    )
)]
pub async fn create_my_ad(
    SignedIn(session): SignedIn,
    State(state): State<AppState>,
    Json(payload): Json<CreateAdvertisementRequest>,
) -> AppResult<(StatusCode, Json<Advertisement>)> {
    let created = advertisements::submit(state.repo.as_ref(), &session, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// request_image_upload
///
/// [Authenticated Route] Issues a presigned PUT URL for an advertisement image and the
/// public URL to reference it by.
#[utoipa::path(
    post,
    path = "/uploads/ad-image",
    request_body = ImageUploadRequest,
    responses(
        (status = 200, description = "URL", body = ImageUploadResponse),
        (status = 400, description = "Not an image", body = ErrorBody)
    )
)]
pub async fn request_image_upload(
    SignedIn(session): SignedIn,
    State(state): State<AppState>,
    Json(payload): Json<ImageUploadRequest>,
) -> AppResult<Json<ImageUploadResponse>> {
    if !storage::is_image_content_type(&payload.content_type) {
        return Err(AppError::BadRequest(format!(
            "unsupported content type: {}",
            payload.content_type
        )));
    }

    let key = storage::image_object_key(session.user_id, &payload.filename);
    let upload_url = state
        .storage
        .presign_upload(&key, payload.content_type.trim())
        .await
        .map_err(AppError::Storage)?;

    Ok(Json(ImageUploadResponse {
        upload_url,
        image_url: state.storage.public_url(&key),
        resource_key: key,
    }))
}

// --- Admin Handlers ---

/// get_admin_dashboard
///
/// [Admin Route] Every advertisement, newest first.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "All advertisements", body = [AdvertisementCard]),
        (status = 303, description = "Redirect to login or dashboard")
    )
)]
pub async fn get_admin_dashboard(
    AdminViewer { token, .. }: AdminViewer,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdvertisementCard>>> {
    let ads = advertisements::admin_feed(state.repo.as_ref(), &token).await?;
    Ok(Json(ads))
}

/// update_advertisement_status
///
/// [Admin Route] Approves or rejects a pending advertisement and returns the re-fetched
/// admin list.
#[utoipa::path(
    post,
    path = "/admin/advertisements/{id}/status",
    params(("id" = Uuid, Path, description = "Advertisement ID")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Refreshed list", body = [AdvertisementCard]),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Not pending", body = ErrorBody),
        (status = 303, description = "Redirect to login or dashboard")
    )
)]
pub async fn update_advertisement_status(
    AdminViewer { token, .. }: AdminViewer,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<Vec<AdvertisementCard>>> {
    let ads = moderation::set_status(state.repo.as_ref(), &token, id, payload.status).await?;
    Ok(Json(ads))
}

/// get_admin_categories
///
/// [Admin Route] The category management list.
#[utoipa::path(
    get,
    path = "/admin/categories",
    responses(
        (status = 200, description = "Categories", body = [Category]),
        (status = 303, description = "Redirect to login or dashboard")
    )
)]
pub async fn get_admin_categories(
    _admin: AdminViewer,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(categories::list(state.repo.as_ref()).await?))
}

/// create_category
///
/// [Admin Route] Adds a category and returns the re-fetched list. Blank names insert
/// nothing.
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Refreshed list", body = [Category]),
        (status = 303, description = "Redirect to login or dashboard")
    )
)]
pub async fn create_category(
    AdminViewer { token, .. }: AdminViewer,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<Vec<Category>>> {
    let list = categories::add(state.repo.as_ref(), &token, &payload.name).await?;
    Ok(Json(list))
}
