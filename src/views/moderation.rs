use uuid::Uuid;

use crate::{
    error::RepoError,
    models::{AdminToken, AdvertisementCard, ModerationDecision},
    repository::Repository,
    views::advertisements::admin_feed,
};

/// set_status
///
/// Applies an admin decision to one advertisement, then re-reads the whole admin feed.
/// On failure nothing is re-read and the error is returned as-is.
pub async fn set_status(
    repo: &dyn Repository,
    token: &AdminToken,
    id: Uuid,
    decision: ModerationDecision,
) -> Result<Vec<AdvertisementCard>, RepoError> {
    repo.update_advertisement_status(token, id, decision).await?;
    admin_feed(repo, token).await
}
