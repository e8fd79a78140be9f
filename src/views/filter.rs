use std::str::FromStr;

use uuid::Uuid;

use crate::{
    error::RepoError,
    models::Advertisement,
    repository::{AdvertisementFilter, Repository},
};

/// CategoryFilter
///
/// The category selector of the landing screen. Starts at `All`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(Uuid),
}

impl FromStr for CategoryFilter {
    type Err = String;

    /// Accepts `all` or a category id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        Uuid::parse_str(s)
            .map(CategoryFilter::Category)
            .map_err(|_| format!("invalid category selection: {s}"))
    }
}

impl CategoryFilter {
    fn to_query(self) -> AdvertisementFilter {
        match self {
            CategoryFilter::All => AdvertisementFilter::approved(),
            CategoryFilter::Category(id) => AdvertisementFilter::approved_in(id),
        }
    }
}

/// apply
///
/// Re-queries the backend for approved advertisements in the selection, newest first.
/// Always a fresh round trip; never a filter over a previously loaded list.
pub async fn apply(
    repo: &dyn Repository,
    selection: CategoryFilter,
) -> Result<Vec<Advertisement>, RepoError> {
    repo.query_advertisements(&selection.to_query()).await
}
