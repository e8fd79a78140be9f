use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::RepoError, repository::Repository};

// --- Enumerations (Postgres enum types) ---

/// Role
///
/// The RBAC flag stored on every profile. Maps to the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// AdStatus
///
/// Moderation lifecycle of an advertisement. Maps to the `ad_status` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "ad_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AdStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Approved => "approved",
            AdStatus::Rejected => "rejected",
        }
    }

    /// Whether a record in this status may be moved to `target`.
    ///
    /// Only `pending` records move; re-applying the current terminal status is allowed
    /// so that repeated identical decisions converge on the same state.
    pub fn can_become(self, target: AdStatus) -> bool {
        target != AdStatus::Pending && (self == AdStatus::Pending || self == target)
    }

    /// CSS classes of the status badge shown next to each advertisement.
    pub fn badge_class(self) -> &'static str {
        match self {
            AdStatus::Approved => "bg-green-100 text-green-800",
            AdStatus::Rejected => "bg-red-100 text-red-800",
            AdStatus::Pending => "bg-yellow-100 text-yellow-800",
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ModerationDecision
///
/// The two statuses an administrator can assign. `pending` is not representable,
/// so a moderation request can never reopen a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ModerationDecision {
    Approved,
    Rejected,
}

impl ModerationDecision {
    pub fn status(self) -> AdStatus {
        match self {
            ModerationDecision::Approved => AdStatus::Approved,
            ModerationDecision::Rejected => AdStatus::Rejected,
        }
    }
}

// --- Core Records (Mapped to Database) ---

/// Profile
///
/// One row per authenticated identity in `public.profiles`. The id is shared with the
/// auth subsystem's user id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Advertisement
///
/// A user submission from `public.advertisements`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Advertisement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // Publicly readable image URI, if the owner attached one.
    pub image_url: Option<String>,
    pub status: AdStatus,
    // FK to public.profiles.id (owner = creator).
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Category
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Capabilities ---

/// AdminToken
///
/// Proof that the backend held a profile with `role = admin` for the holder when it
/// was checked. Every privileged repository operation demands one, so authorization
/// no longer depends on each caller remembering to check the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminToken {
    admin_id: Uuid,
}

impl AdminToken {
    /// verify
    ///
    /// Reads the stored profile of `user_id` and mints a token only when its role is
    /// `admin`. A missing profile yields `None`. Profiles built in memory cannot mint.
    pub async fn verify(
        repo: &dyn Repository,
        user_id: Uuid,
    ) -> Result<Option<Self>, RepoError> {
        let profile = repo.get_profile(user_id).await?;
        Ok(profile
            .filter(|profile| profile.role == Role::Admin)
            .map(|profile| Self {
                admin_id: profile.id,
            }))
    }

    pub fn admin_id(&self) -> Uuid {
        self.admin_id
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateAdvertisementRequest
///
/// Input payload for submitting a new advertisement (POST /dashboard/my-ads).
/// Status and owner are never taken from the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateAdvertisementRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

/// NewAdvertisement
///
/// A validated submission, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdvertisement {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
}

impl CreateAdvertisementRequest {
    /// Trims every text field and rejects blank titles or descriptions.
    /// A blank image URL is treated as no image.
    pub fn validate(self) -> Result<NewAdvertisement, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("title must not be empty".to_string());
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err("description must not be empty".to_string());
        }
        let image_url = self
            .image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(NewAdvertisement {
            title: title.to_string(),
            description: description.to_string(),
            image_url,
            category_id: self.category_id,
        })
    }
}

/// StatusUpdateRequest
///
/// Input payload for the moderation endpoint (POST /admin/advertisements/{id}/status).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatusUpdateRequest {
    pub status: ModerationDecision,
}

/// CreateCategoryRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// ImageUploadRequest
///
/// Input payload for requesting a short-lived upload URL for an advertisement image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct ImageUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "bike.jpg")]
    pub filename: String,
    /// Must be an `image/*` MIME type.
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

// --- Screen Payloads (Output) ---

/// ImageUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct ImageUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key inside the bucket.
    pub resource_key: String,
    /// Public URL to store as the advertisement's `image_url`.
    pub image_url: String,
}

/// AdvertisementCard
///
/// An advertisement as shown on the owner and admin lists, with its status badge.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdvertisementCard {
    #[serde(flatten)]
    pub advertisement: Advertisement,
    pub badge_class: String,
}

impl From<Advertisement> for AdvertisementCard {
    fn from(advertisement: Advertisement) -> Self {
        let badge_class = advertisement.status.badge_class().to_string();
        Self {
            advertisement,
            badge_class,
        }
    }
}

/// HomePage
///
/// The landing screen: approved advertisements plus the category list for the filter.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HomePage {
    pub advertisements: Vec<Advertisement>,
    pub categories: Vec<Category>,
}

/// DashboardView
///
/// The general dashboard for a signed-in viewer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardView {
    pub user_id: Uuid,
    pub role: Role,
    pub is_admin: bool,
}

/// ErrorBody
///
/// JSON body of every error response. `error` carries the backend message verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}
