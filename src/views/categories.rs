use crate::{
    error::RepoError,
    models::{AdminToken, Category},
    repository::Repository,
};

/// All categories by name ascending.
pub async fn list(repo: &dyn Repository) -> Result<Vec<Category>, RepoError> {
    repo.list_categories().await
}

/// add
///
/// Inserts `name` after trimming and returns the re-fetched list. A blank name issues
/// no insert and simply returns the current list.
pub async fn add(
    repo: &dyn Repository,
    token: &AdminToken,
    name: &str,
) -> Result<Vec<Category>, RepoError> {
    let name = name.trim();
    if name.is_empty() {
        return list(repo).await;
    }

    repo.insert_category(token, name).await?;
    list(repo).await
}
