use crate::error::RepoError;
use crate::models::{
    AdStatus, AdminToken, Advertisement, Category, ModerationDecision, NewAdvertisement, Profile,
    Role,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const ADVERTISEMENT_COLUMNS: &str =
    "id, title, description, image_url, status, user_id, category_id, created_at, updated_at";

// Name of the advertisements -> categories foreign key in the migrations.
const CATEGORY_FK: &str = "advertisements_category_id_fkey";

/// AdvertisementFilter
///
/// The only way to describe an advertisement query. Each constructor encodes one
/// visibility mode; reading every record regardless of status or owner requires an
/// [`AdminToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementFilter {
    status: Option<AdStatus>,
    owner_id: Option<Uuid>,
    category_id: Option<Uuid>,
}

impl AdvertisementFilter {
    fn unrestricted() -> Self {
        Self {
            status: None,
            owner_id: None,
            category_id: None,
        }
    }

    /// Public feed: approved records only.
    pub fn approved() -> Self {
        Self {
            status: Some(AdStatus::Approved),
            ..Self::unrestricted()
        }
    }

    /// Public feed narrowed to one category.
    pub fn approved_in(category_id: Uuid) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::approved()
        }
    }

    /// Owner feed: every record created by `owner_id`, whatever its status.
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::unrestricted()
        }
    }

    /// Admin feed: no restriction at all.
    pub fn everything(_token: &AdminToken) -> Self {
        Self::unrestricted()
    }

    pub fn status(&self) -> Option<AdStatus> {
        self.status
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    /// Whether `ad` belongs to the result set described by this filter.
    pub fn matches(&self, ad: &Advertisement) -> bool {
        self.status.is_none_or(|status| ad.status == status)
            && self.owner_id.is_none_or(|owner| ad.user_id == owner)
            && self
                .category_id
                .is_none_or(|category| ad.category_id == Some(category))
    }
}

/// Repository Trait
///
/// Contract of the managed backend: profiles, advertisements and categories.
/// Privileged mutations take an [`AdminToken`] so the role check happens before the
/// call can even be expressed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError>;

    // --- Advertisements ---
    // Results are always ordered newest first.
    async fn query_advertisements(
        &self,
        filter: &AdvertisementFilter,
    ) -> Result<Vec<Advertisement>, RepoError>;
    // New records always start as `pending`.
    async fn create_advertisement(
        &self,
        owner_id: Uuid,
        ad: &NewAdvertisement,
    ) -> Result<Advertisement, RepoError>;
    // Admin action: single-row status change. Fails with NotFound or InvalidTransition.
    async fn update_advertisement_status(
        &self,
        token: &AdminToken,
        id: Uuid,
        decision: ModerationDecision,
    ) -> Result<Advertisement, RepoError>;

    // --- Categories ---
    // Always ordered by name ascending.
    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;
    async fn insert_category(&self, token: &AdminToken, name: &str)
    -> Result<Category, RepoError>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by the managed Postgres database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_advertisement(&self, id: Uuid) -> Result<Option<Advertisement>, RepoError> {
        let sql = format!("SELECT {ADVERTISEMENT_COLUMNS} FROM advertisements WHERE id = $1");
        let ad = sqlx::query_as::<_, Advertisement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ad)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, role, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// query_advertisements
    ///
    /// Builds the WHERE clause from the filter with bound parameters only.
    async fn query_advertisements(
        &self,
        filter: &AdvertisementFilter,
    ) -> Result<Vec<Advertisement>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {ADVERTISEMENT_COLUMNS} FROM advertisements WHERE TRUE"
        ));

        if let Some(status) = filter.status() {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        if let Some(owner_id) = filter.owner_id() {
            builder.push(" AND user_id = ");
            builder.push_bind(owner_id);
        }
        if let Some(category_id) = filter.category_id() {
            builder.push(" AND category_id = ");
            builder.push_bind(category_id);
        }

        builder.push(" ORDER BY created_at DESC");

        let ads = builder
            .build_query_as::<Advertisement>()
            .fetch_all(&self.pool)
            .await?;
        Ok(ads)
    }

    async fn create_advertisement(
        &self,
        owner_id: Uuid,
        ad: &NewAdvertisement,
    ) -> Result<Advertisement, RepoError> {
        let sql = format!(
            "INSERT INTO advertisements \
             (id, title, description, image_url, status, user_id, category_id) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6) RETURNING {ADVERTISEMENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Advertisement>(&sql)
            .bind(Uuid::new_v4())
            .bind(&ad.title)
            .bind(&ad.description)
            .bind(&ad.image_url)
            .bind(owner_id)
            .bind(ad.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify_insert_error(e, ad.category_id))?;
        Ok(created)
    }

    /// update_advertisement_status
    ///
    /// Conditional update: the row changes only while it is `pending` or already holds
    /// the requested status. A miss is classified by re-reading the row.
    async fn update_advertisement_status(
        &self,
        token: &AdminToken,
        id: Uuid,
        decision: ModerationDecision,
    ) -> Result<Advertisement, RepoError> {
        let target = decision.status();
        let sql = format!(
            "UPDATE advertisements SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND (status = 'pending' OR status = $1) \
             RETURNING {ADVERTISEMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Advertisement>(&sql)
            .bind(target)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(ad) => {
                tracing::info!(
                    admin = %token.admin_id(),
                    ad = %id,
                    status = %target,
                    "advertisement moderated"
                );
                Ok(ad)
            }
            None => match self.find_advertisement(id).await? {
                Some(current) => Err(RepoError::InvalidTransition {
                    from: current.status,
                    to: target,
                }),
                None => Err(RepoError::NotFound(id)),
            },
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories \
             ORDER BY LOWER(name) ASC, name COLLATE \"C\" ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn insert_category(
        &self,
        token: &AdminToken,
        name: &str,
    ) -> Result<Category, RepoError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(admin = %token.admin_id(), category = %category.id, "category created");
        Ok(category)
    }
}

/// A category foreign-key violation names a category that does not exist. Every other
/// failure stays a backend error with the database message.
fn classify_insert_error(err: sqlx::Error, category_id: Option<Uuid>) -> RepoError {
    if let (Some(category_id), sqlx::Error::Database(db_err)) = (category_id, &err) {
        if db_err.constraint() == Some(CATEGORY_FK) {
            return RepoError::UnknownCategory(category_id);
        }
    }
    RepoError::from(err)
}

/// Case-insensitive name order, ties broken by byte order. Matches the
/// `ORDER BY LOWER(name), name COLLATE "C"` of the Postgres query.
fn by_category_name(a: &Category, b: &Category) -> std::cmp::Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

#[derive(Default)]
struct Store {
    profiles: HashMap<Uuid, Profile>,
    advertisements: Vec<Advertisement>,
    categories: Vec<Category>,
}

/// InMemoryRepository
///
/// A process-local `Repository` honouring the same visibility, ordering, reference and
/// transition rules as Postgres. Used by the test suites and for running the service
/// without a database. Every trait call is counted so tests can assert that no query
/// was issued.
///
/// Category names are folded with Unicode lowercasing, which agrees with the
/// database's `LOWER` for ASCII names and may differ for others.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    calls: AtomicUsize,
    // When set, every trait call fails with this backend message.
    failure: Mutex<Option<String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_call(&self) -> Result<(), RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match failure.as_ref() {
            Some(message) => Err(RepoError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with `message`, or recover with `None`.
    pub fn fail_with(&self, message: Option<&str>) {
        *self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = message.map(str::to_string);
    }

    /// Seeds a profile and returns it.
    pub fn add_profile(&self, id: Uuid, role: Role) -> Profile {
        let now = Utc::now();
        let profile = Profile {
            id,
            role,
            created_at: now,
            updated_at: now,
        };
        self.store().profiles.insert(id, profile.clone());
        profile
    }

    /// Seeds an advertisement exactly as given, bypassing moderation rules.
    pub fn add_advertisement(&self, ad: Advertisement) {
        self.store().advertisements.push(ad);
    }

    /// Seeds a category and returns it.
    pub fn add_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store().categories.push(category.clone());
        category
    }

    /// Current state of one advertisement, without counting as a call.
    pub fn advertisement(&self, id: Uuid) -> Option<Advertisement> {
        self.store()
            .advertisements
            .iter()
            .find(|ad| ad.id == id)
            .cloned()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        self.begin_call()?;
        Ok(self.store().profiles.get(&id).cloned())
    }

    async fn query_advertisements(
        &self,
        filter: &AdvertisementFilter,
    ) -> Result<Vec<Advertisement>, RepoError> {
        self.begin_call()?;
        let mut ads: Vec<Advertisement> = self
            .store()
            .advertisements
            .iter()
            .filter(|ad| filter.matches(ad))
            .cloned()
            .collect();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ads)
    }

    async fn create_advertisement(
        &self,
        owner_id: Uuid,
        ad: &NewAdvertisement,
    ) -> Result<Advertisement, RepoError> {
        self.begin_call()?;
        let mut store = self.store();
        if let Some(category_id) = ad.category_id {
            if !store.categories.iter().any(|c| c.id == category_id) {
                return Err(RepoError::UnknownCategory(category_id));
            }
        }

        let now = Utc::now();
        let created = Advertisement {
            id: Uuid::new_v4(),
            title: ad.title.clone(),
            description: ad.description.clone(),
            image_url: ad.image_url.clone(),
            status: AdStatus::Pending,
            user_id: owner_id,
            category_id: ad.category_id,
            created_at: now,
            updated_at: now,
        };
        store.advertisements.push(created.clone());
        Ok(created)
    }

    async fn update_advertisement_status(
        &self,
        _token: &AdminToken,
        id: Uuid,
        decision: ModerationDecision,
    ) -> Result<Advertisement, RepoError> {
        self.begin_call()?;
        let target = decision.status();
        let mut store = self.store();
        let ad = store
            .advertisements
            .iter_mut()
            .find(|ad| ad.id == id)
            .ok_or(RepoError::NotFound(id))?;

        if !ad.status.can_become(target) {
            return Err(RepoError::InvalidTransition {
                from: ad.status,
                to: target,
            });
        }
        ad.status = target;
        ad.updated_at = Utc::now();
        Ok(ad.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        self.begin_call()?;
        let mut categories = self.store().categories.clone();
        categories.sort_by(by_category_name);
        Ok(categories)
    }

    async fn insert_category(
        &self,
        _token: &AdminToken,
        name: &str,
    ) -> Result<Category, RepoError> {
        self.begin_call()?;
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store().categories.push(category.clone());
        Ok(category)
    }
}
