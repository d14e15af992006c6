//! Sponsored listing flow against an in-memory sqlite store.

use castarr::db::{NewListing, Store};
use castarr::models::ListingStatus;
use castarr::services::SponsoredService;

fn listing_input(title: &str, priority: u8) -> NewListing {
    NewListing {
        title: title.to_string(),
        image_url: "https://cdn.example.com/art.jpg".to_string(),
        description: "A sponsored show".to_string(),
        url: "https://example.com".to_string(),
        feed_url: "https://feeds.example.com/show".to_string(),
        categories: vec!["Technology".to_string(), "True Crime".to_string()],
        priority,
        starts_at: None,
        ends_at: None,
        impression_limit: 0,
        click_limit: 0,
    }
}

#[tokio::test]
async fn matching_charges_one_impression_per_call() {
    let store = Store::in_memory().await.unwrap();
    let service = SponsoredService::from_store(&store);
    let created = store
        .listing_repo()
        .create(listing_input("Acme", 50))
        .await
        .unwrap();

    let matched = service.get_matching(&[], 3).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, created.id);
    assert_eq!(matched[0].total_impressions, 1);

    let matched = service.get_matching(&[], 3).await.unwrap();
    assert_eq!(matched[0].total_impressions, 2);
}

#[tokio::test]
async fn listing_expires_exactly_on_the_limiting_impression() {
    let store = Store::in_memory().await.unwrap();
    let service = SponsoredService::from_store(&store);
    let mut input = listing_input("Limited", 50);
    input.impression_limit = 5;
    let created = store.listing_repo().create(input).await.unwrap();

    for call in 1..=5 {
        let matched = service.get_matching(&[], 1).await.unwrap();
        assert_eq!(matched.len(), 1, "call {call} should still match");
        assert_eq!(matched[0].total_impressions, call);
    }

    // The fifth impression flipped it, so the sixth call finds nothing.
    let row = store.listing_repo().get(created.id).await.unwrap().unwrap();
    assert_eq!(row.status, ListingStatus::Expired);
    assert!(service.get_matching(&[], 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn click_limit_expires_listing_too() {
    let store = Store::in_memory().await.unwrap();
    let service = SponsoredService::from_store(&store);
    let mut input = listing_input("OneClick", 50);
    input.click_limit = 1;
    let created = store.listing_repo().create(input).await.unwrap();

    let updated = service.record_click(created.id).await.unwrap();
    assert_eq!(updated.total_clicks, 1);

    let row = store.listing_repo().get(created.id).await.unwrap().unwrap();
    assert_eq!(row.status, ListingStatus::Expired);
}

#[tokio::test]
async fn category_hints_filter_candidates() {
    let store = Store::in_memory().await.unwrap();
    let service = SponsoredService::from_store(&store);
    store
        .listing_repo()
        .create(listing_input("Tech Show", 50))
        .await
        .unwrap();
    let mut sports = listing_input("Sports Show", 50);
    sports.categories = vec!["Sports".to_string()];
    store.listing_repo().create(sports).await.unwrap();

    let matched = service
        .get_matching(&["technology".to_string()], 5)
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Tech Show");
}

#[tokio::test]
async fn higher_priority_listings_win_the_slots() {
    let store = Store::in_memory().await.unwrap();
    let service = SponsoredService::from_store(&store);
    for (title, priority) in [("Low", 10u8), ("High", 90), ("Mid", 50)] {
        store
            .listing_repo()
            .create(listing_input(title, priority))
            .await
            .unwrap();
    }

    let matched = service.get_matching(&[], 2).await.unwrap();
    assert_eq!(matched.len(), 2);
    assert_eq!(matched[0].title, "High");
    assert_eq!(matched[1].title, "Mid");
}

#[tokio::test]
async fn daily_stats_accumulate_per_listing() {
    let store = Store::in_memory().await.unwrap();
    let service = SponsoredService::from_store(&store);
    let created = store
        .listing_repo()
        .create(listing_input("Tracked", 50))
        .await
        .unwrap();

    service.get_matching(&[], 1).await.unwrap();
    service.get_matching(&[], 1).await.unwrap();
    service.record_click(created.id).await.unwrap();

    let stats = store.listing_repo().stats_for(created.id).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].impressions, 2);
    assert_eq!(stats[0].clicks, 1);
}
