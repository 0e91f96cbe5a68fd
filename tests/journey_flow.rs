// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end daily update flow over an in-memory store and fake
//! collaborators.

mod common;

use common::{date, person, started_journey, FakeGeo, FakeImages, FakeSteps};
use trek_tracker::models::JourneyState;
use trek_tracker::services::{JourneyUpdater, MapRenderer};

fn two_walkers() -> FakeSteps {
    FakeSteps::new(vec![person(1, "Siri"), person(2, "Jonas")])
}

#[tokio::test]
async fn test_single_day_commits_steps_and_location() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 600);
    steps.record(2, "2024-03-01", 400);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();

    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);
    let messages = updater.run_pending_updates(date("2024-03-01")).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert!(messages[0].fallback.contains("Day 1"));

    // 1000 steps at 0.75 m/step
    let location = store
        .location_for_date(journey_id, date("2024-03-01"))
        .unwrap()
        .expect("day committed");
    assert_eq!(location.distance_meters, 750.0);
    assert_eq!(location.nearest_waypoint, 0);
    assert_eq!(location.address.as_deref(), Some("Kirkegata 1, Moss"));
    assert_eq!(location.country.as_deref(), Some("Norway"));

    let history = store.steps_up_to(journey_id, date("2024-03-01")).unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 600);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let first = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    assert_eq!(first.len(), 1);

    let second = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    assert!(second.is_empty());

    // No duplicate rows
    assert_eq!(store.steps_up_to(journey_id, date("2024-03-01")).unwrap().len(), 1);
    assert_eq!(store.locations(journey_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_catch_up_processes_missed_days_in_order() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 600); // 450 m
    steps.record(1, "2024-03-02", 800); // 600 m
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-02")).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].fallback.contains("Day 1"));
    assert!(messages[1].fallback.contains("Day 2"));

    let locations = store.locations(journey_id).unwrap();
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].distance_meters, 450.0);
    assert_eq!(locations[1].distance_meters, 1050.0); // cumulative
}

#[tokio::test]
async fn test_day_without_data_defers_rest_of_run() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    // Nothing on 03-01; data exists for 03-02 but must wait
    steps.record(1, "2024-03-02", 800);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-02")).await.unwrap();
    assert!(messages.is_empty());
    assert!(store.locations(journey_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_steps_count_as_no_contribution() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 0); // synced but did not move
    steps.record(2, "2024-03-01", 1);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    assert_eq!(messages.len(), 1);

    // Only the single-step contributor is stored
    let history = store.steps_up_to(journey_id, date("2024-03-01")).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].person_id, 2);
    assert_eq!(history[0].amount, 1);
}

#[tokio::test]
async fn test_provider_failure_skips_person_not_day() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 600);
    steps.record(2, "2024-03-01", 9999);
    steps.failing.insert(2);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    assert_eq!(messages.len(), 1);

    let history = store.steps_up_to(journey_id, date("2024-03-01")).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].person_id, 1);
}

#[tokio::test]
async fn test_geo_failure_still_commits_day() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 600);
    let geo = FakeGeo {
        address: None,
        poi: None,
        failing: true,
    };
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    assert_eq!(messages.len(), 1);

    let location = store
        .location_for_date(journey_id, date("2024-03-01"))
        .unwrap()
        .expect("committed despite geocoder outage");
    assert!(location.address.is_none());
    assert!(location.country.is_none());
}

#[tokio::test]
async fn test_finish_transition_and_terminal_state() {
    let (store, journey_id) = started_journey("2024-03-01");
    let mut steps = two_walkers();
    steps.record(1, "2024-03-01", 5000); // 3750 m on a 3000 m route
    steps.record(1, "2024-03-02", 5000); // must never be processed
    let geo = FakeGeo::with_address("Fyrveien 1, Lindesnes", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-02")).await.unwrap();
    // Daily report plus the finish celebration
    assert_eq!(messages.len(), 2);
    assert!(messages[1].fallback.contains("finished"));

    let journey = store.journey(journey_id).unwrap().unwrap();
    assert_eq!(journey.state(), JourneyState::Finished);
    assert_eq!(journey.finished_at, Some(date("2024-03-01")));

    // Finished journeys are terminal: nothing further to process
    let after = updater.run_pending_updates(date("2024-03-05")).await.unwrap();
    assert!(after.is_empty());
    assert_eq!(store.locations(journey_id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_weigh_in_collection_tolerates_missing_data() {
    let mut steps = two_walkers();
    steps.weights.insert(1, 64.2);

    let entries = trek_tracker::services::update::collect_weights(
        &steps,
        &steps.participants,
        date("2024-03-01"),
    )
    .await;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], ("Siri".to_string(), Some(64.2)));
    assert_eq!(entries[1], ("Jonas".to_string(), None));
}

#[tokio::test]
async fn test_no_ongoing_journey_is_a_noop() {
    let store = trek_tracker::db::JourneyStore::open_in_memory().unwrap();
    let steps = two_walkers();
    let geo = FakeGeo::with_address("Anywhere", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    assert!(messages.is_empty());
}
