use crate::{
    auth::Session,
    error::RepoError,
    models::{AdminToken, Advertisement, AdvertisementCard, CreateAdvertisementRequest, HomePage},
    repository::{AdvertisementFilter, Repository},
};

/// Approved advertisements, newest first. No identity needed.
pub async fn public_feed(repo: &dyn Repository) -> Result<Vec<Advertisement>, RepoError> {
    repo.query_advertisements(&AdvertisementFilter::approved()).await
}

/// The viewer's own advertisements in every status, newest first.
/// Without a session the query is skipped and the list is empty.
pub async fn owner_feed(
    repo: &dyn Repository,
    session: Option<&Session>,
) -> Result<Vec<AdvertisementCard>, RepoError> {
    let Some(session) = session else {
        return Ok(Vec::new());
    };
    let ads = repo
        .query_advertisements(&AdvertisementFilter::owned_by(session.user_id))
        .await?;
    Ok(ads.into_iter().map(AdvertisementCard::from).collect())
}

/// Every advertisement, newest first.
pub async fn admin_feed(
    repo: &dyn Repository,
    token: &AdminToken,
) -> Result<Vec<AdvertisementCard>, RepoError> {
    let ads = repo
        .query_advertisements(&AdvertisementFilter::everything(token))
        .await?;
    Ok(ads.into_iter().map(AdvertisementCard::from).collect())
}

/// home_page
///
/// Landing screen data. The public feed and the category list are read concurrently;
/// the first failure wins.
pub async fn home_page(repo: &dyn Repository) -> Result<HomePage, RepoError> {
    let (advertisements, categories) = tokio::join!(public_feed(repo), repo.list_categories());
    Ok(HomePage {
        advertisements: advertisements?,
        categories: categories?,
    })
}

/// SubmitError
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// submit
///
/// Creates a `pending` advertisement owned by the session's identity.
pub async fn submit(
    repo: &dyn Repository,
    session: &Session,
    request: CreateAdvertisementRequest,
) -> Result<Advertisement, SubmitError> {
    let new_ad = request.validate().map_err(SubmitError::Invalid)?;
    let created = repo.create_advertisement(session.user_id, &new_ad).await?;
    tracing::info!(ad = %created.id, owner = %session.user_id, "advertisement submitted");
    Ok(created)
}
