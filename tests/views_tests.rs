use adboard::{
    InMemoryRepository,
    auth::Session,
    error::RepoError,
    models::{
        AdStatus, AdminToken, Advertisement, CreateAdvertisementRequest, ModerationDecision,
        Role,
    },
    views::{
        advertisements::{self, SubmitError},
        categories,
        filter::{self, CategoryFilter},
        moderation,
    },
};
use chrono::{Duration, Utc};
use uuid::Uuid;

// --- Test Data Helpers ---

const OWNER_A: Uuid = Uuid::from_u128(10);
const OWNER_B: Uuid = Uuid::from_u128(11);
const ADMIN_ID: Uuid = Uuid::from_u128(99);

fn ad(owner: Uuid, status: AdStatus, category: Option<Uuid>, minutes_ago: i64) -> Advertisement {
    let created = Utc::now() - Duration::minutes(minutes_ago);
    Advertisement {
        id: Uuid::new_v4(),
        title: format!("ad {minutes_ago}"),
        description: "for sale".to_string(),
        image_url: None,
        status,
        user_id: owner,
        category_id: category,
        created_at: created,
        updated_at: created,
    }
}

async fn admin_token(repo: &InMemoryRepository) -> AdminToken {
    repo.add_profile(ADMIN_ID, Role::Admin);
    AdminToken::verify(repo, ADMIN_ID).await.unwrap().unwrap()
}

fn session(user_id: Uuid) -> Session {
    Session {
        user_id,
        access_token: None,
    }
}

/// One record per (owner, status) pair, created at distinct times.
fn seeded() -> (InMemoryRepository, Vec<Advertisement>) {
    let repo = InMemoryRepository::new();
    let mut ads = Vec::new();
    let mut minutes = 0;
    for owner in [OWNER_A, OWNER_B] {
        for status in [AdStatus::Pending, AdStatus::Approved, AdStatus::Rejected] {
            minutes += 5;
            let record = ad(owner, status, None, minutes);
            repo.add_advertisement(record.clone());
            ads.push(record);
        }
    }
    (repo, ads)
}

fn ids(ads: &[Advertisement]) -> Vec<Uuid> {
    ads.iter().map(|ad| ad.id).collect()
}

// --- Advertisement Feeds ---

#[tokio::test]
async fn test_public_feed_contains_exactly_the_approved_records() {
    let (repo, all) = seeded();

    let feed = advertisements::public_feed(&repo).await.unwrap();

    for record in &all {
        let visible = feed.iter().any(|ad| ad.id == record.id);
        assert_eq!(visible, record.status == AdStatus::Approved, "{:?}", record.status);
    }
}

#[tokio::test]
async fn test_owner_feed_contains_exactly_the_viewers_records() {
    let (repo, all) = seeded();

    let feed = advertisements::owner_feed(&repo, Some(&session(OWNER_A)))
        .await
        .unwrap();

    for record in &all {
        let visible = feed.iter().any(|card| card.advertisement.id == record.id);
        assert_eq!(visible, record.user_id == OWNER_A);
    }
    assert_eq!(feed.len(), 3);
}

#[tokio::test]
async fn test_owner_feed_without_session_is_empty_and_issues_no_query() {
    let (repo, _) = seeded();

    let feed = advertisements::owner_feed(&repo, None).await.unwrap();

    assert!(feed.is_empty());
    assert_eq!(repo.calls(), 0);
}

#[tokio::test]
async fn test_admin_feed_lists_everything_newest_first() {
    let (repo, all) = seeded();
    let token = admin_token(&repo).await;

    let feed = advertisements::admin_feed(&repo, &token).await.unwrap();

    let listed: Vec<Uuid> = feed.iter().map(|card| card.advertisement.id).collect();
    let mut expected = all.clone();
    expected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    assert_eq!(listed, ids(&expected));
}

#[tokio::test]
async fn test_feed_errors_carry_backend_message() {
    let (repo, _) = seeded();
    repo.fail_with(Some("permission denied for table advertisements"));

    let err = advertisements::public_feed(&repo).await.unwrap_err();

    assert_eq!(err.to_string(), "permission denied for table advertisements");
}

#[tokio::test]
async fn test_home_page_reads_feed_and_categories() {
    let (repo, _) = seeded();
    repo.add_category("Vehicles");
    repo.add_category("Books");

    let page = advertisements::home_page(&repo).await.unwrap();

    assert_eq!(page.advertisements.len(), 2);
    assert!(page.advertisements.iter().all(|ad| ad.status == AdStatus::Approved));
    let names: Vec<&str> = page.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Books", "Vehicles"]);
}

#[tokio::test]
async fn test_submit_creates_pending_record_owned_by_viewer() {
    let repo = InMemoryRepository::new();
    let request = CreateAdvertisementRequest {
        title: "  Road bike  ".to_string(),
        description: "Barely used".to_string(),
        image_url: Some("   ".to_string()),
        category_id: None,
    };

    let created = advertisements::submit(&repo, &session(OWNER_A), request)
        .await
        .unwrap();

    assert_eq!(created.status, AdStatus::Pending);
    assert_eq!(created.user_id, OWNER_A);
    assert_eq!(created.title, "Road bike");
    assert_eq!(created.image_url, None);
    assert!(advertisements::public_feed(&repo).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_rejects_blank_title_without_insert() {
    let repo = InMemoryRepository::new();
    let request = CreateAdvertisementRequest {
        title: "   ".to_string(),
        description: "Barely used".to_string(),
        ..CreateAdvertisementRequest::default()
    };

    let err = advertisements::submit(&repo, &session(OWNER_A), request)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::Invalid(_)));
    assert_eq!(repo.calls(), 0);
}

#[tokio::test]
async fn test_submit_with_unknown_category_is_rejected() {
    let repo = InMemoryRepository::new();
    let unknown = Uuid::new_v4();
    let request = CreateAdvertisementRequest {
        title: "Road bike".to_string(),
        description: "Barely used".to_string(),
        category_id: Some(unknown),
        ..CreateAdvertisementRequest::default()
    };

    let err = advertisements::submit(&repo, &session(OWNER_A), request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Repo(RepoError::UnknownCategory(id)) if id == unknown
    ));
    assert!(
        advertisements::owner_feed(&repo, Some(&session(OWNER_A)))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_submit_with_known_category_keeps_it() {
    let repo = InMemoryRepository::new();
    let vehicles = repo.add_category("Vehicles");
    let request = CreateAdvertisementRequest {
        title: "Road bike".to_string(),
        description: "Barely used".to_string(),
        category_id: Some(vehicles.id),
        ..CreateAdvertisementRequest::default()
    };

    let created = advertisements::submit(&repo, &session(OWNER_A), request)
        .await
        .unwrap();

    assert_eq!(created.category_id, Some(vehicles.id));
}

// --- Status Transitions ---

#[tokio::test]
async fn test_approve_refreshes_admin_feed_and_changes_only_the_target() {
    let (repo, all) = seeded();
    let token = admin_token(&repo).await;
    let target = all
        .iter()
        .find(|ad| ad.status == AdStatus::Pending)
        .unwrap()
        .clone();

    let refreshed = moderation::set_status(&repo, &token, target.id, ModerationDecision::Approved)
        .await
        .unwrap();

    assert_eq!(refreshed.len(), all.len());
    for card in &refreshed {
        let before = all.iter().find(|ad| ad.id == card.advertisement.id).unwrap();
        if card.advertisement.id == target.id {
            assert_eq!(card.advertisement.status, AdStatus::Approved);
            assert_eq!(card.badge_class, "bg-green-100 text-green-800");
        } else {
            assert_eq!(card.advertisement.status, before.status);
        }
    }
}

#[tokio::test]
async fn test_repeated_identical_decision_is_idempotent() {
    let repo = InMemoryRepository::new();
    let token = admin_token(&repo).await;
    let record = ad(OWNER_A, AdStatus::Pending, None, 1);
    repo.add_advertisement(record.clone());

    for _ in 0..2 {
        moderation::set_status(&repo, &token, record.id, ModerationDecision::Approved)
            .await
            .unwrap();
    }

    assert_eq!(repo.advertisement(record.id).unwrap().status, AdStatus::Approved);
}

#[tokio::test]
async fn test_decided_record_cannot_flip() {
    let repo = InMemoryRepository::new();
    let token = admin_token(&repo).await;
    let record = ad(OWNER_A, AdStatus::Approved, None, 1);
    repo.add_advertisement(record.clone());

    let err = moderation::set_status(&repo, &token, record.id, ModerationDecision::Rejected)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::InvalidTransition {
            from: AdStatus::Approved,
            to: AdStatus::Rejected
        }
    ));
    assert_eq!(repo.advertisement(record.id).unwrap().status, AdStatus::Approved);
}

#[tokio::test]
async fn test_unknown_record_is_not_found_and_feed_not_refetched() {
    let repo = InMemoryRepository::new();
    let token = admin_token(&repo).await;
    let missing = Uuid::new_v4();
    let before = repo.calls();

    let err = moderation::set_status(&repo, &token, missing, ModerationDecision::Approved)
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
    // Only the failed update was issued.
    assert_eq!(repo.calls() - before, 1);
}

// --- Category Filter ---

#[test]
fn test_category_filter_parsing() {
    let id = Uuid::new_v4();
    assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
    assert_eq!("".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
    assert_eq!(
        id.to_string().parse::<CategoryFilter>(),
        Ok(CategoryFilter::Category(id))
    );
    assert!("vehicles".parse::<CategoryFilter>().is_err());
    assert_eq!(CategoryFilter::default(), CategoryFilter::All);
}

#[tokio::test]
async fn test_category_selection_requeries_approved_records_in_category() {
    let repo = InMemoryRepository::new();
    let vehicles = repo.add_category("Vehicles");
    let books = repo.add_category("Books");

    let newest = ad(OWNER_A, AdStatus::Approved, Some(vehicles.id), 1);
    let older = ad(OWNER_B, AdStatus::Approved, Some(vehicles.id), 30);
    let pending = ad(OWNER_A, AdStatus::Pending, Some(vehicles.id), 2);
    let other = ad(OWNER_A, AdStatus::Approved, Some(books.id), 3);
    for record in [&older, &pending, &newest, &other] {
        repo.add_advertisement(record.clone());
    }

    let in_vehicles = filter::apply(&repo, CategoryFilter::Category(vehicles.id))
        .await
        .unwrap();
    assert_eq!(ids(&in_vehicles), vec![newest.id, older.id]);

    let everything = filter::apply(&repo, CategoryFilter::All).await.unwrap();
    assert_eq!(ids(&everything), vec![newest.id, other.id, older.id]);

    assert_eq!(repo.calls(), 2);
}

// --- Categories ---

#[tokio::test]
async fn test_categories_are_listed_by_name_regardless_of_insertion_order() {
    let repo = InMemoryRepository::new();
    let token = admin_token(&repo).await;

    for name in ["Pets", "Electronics", "Jobs"] {
        categories::add(&repo, &token, name).await.unwrap();
    }

    let names: Vec<String> = categories::list(&repo)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Electronics", "Jobs", "Pets"]);
}

#[tokio::test]
async fn test_category_order_ignores_case() {
    let repo = InMemoryRepository::new();
    for name in ["Banana", "cherry", "apple", "Apple"] {
        repo.add_category(name);
    }

    let names: Vec<String> = categories::list(&repo)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Apple", "apple", "Banana", "cherry"]);
}

#[tokio::test]
async fn test_blank_category_name_is_a_no_op() {
    let repo = InMemoryRepository::new();
    let token = admin_token(&repo).await;
    repo.add_category("Books");
    let before = repo.calls();

    let list = categories::add(&repo, &token, "   \t ").await.unwrap();

    assert_eq!(list.len(), 1);
    // Only the list read was issued, never an insert.
    assert_eq!(repo.calls() - before, 1);
}

#[tokio::test]
async fn test_category_name_is_trimmed_and_list_refetched() {
    let repo = InMemoryRepository::new();
    let token = admin_token(&repo).await;
    let before = repo.calls();

    let list = categories::add(&repo, &token, "  Garden  ").await.unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Garden");
    assert_eq!(repo.calls() - before, 2);
}
