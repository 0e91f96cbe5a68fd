// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record announcements produced by the daily update.

mod common;

use common::{date, person, started_journey, FakeGeo, FakeImages, FakeSteps};
use trek_tracker::services::{JourneyUpdater, MapRenderer};

fn walkers() -> FakeSteps {
    FakeSteps::new(vec![person(1, "Siri"), person(2, "Jonas")])
}

#[tokio::test]
async fn test_first_day_announces_first_occurrence() {
    let (store, _) = started_journey("2024-03-01");
    let mut steps = walkers();
    steps.record(1, "2024-03-01", 700);
    steps.record(2, "2024-03-01", 300);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-01")).await.unwrap();
    let rendered = serde_json::to_string(&messages[0].blocks).unwrap();
    assert!(rendered.contains("First entry in the books"));
    assert!(rendered.contains("Siri"));
}

#[tokio::test]
async fn test_new_record_credits_previous_holder() {
    let (store, _) = started_journey("2024-03-01");
    let mut steps = walkers();
    steps.record(1, "2024-03-01", 700);
    steps.record(2, "2024-03-01", 300);
    steps.record(1, "2024-03-02", 200);
    steps.record(2, "2024-03-02", 900); // Jonas beats Siri's 700
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-02")).await.unwrap();
    assert_eq!(messages.len(), 2);

    let day2 = serde_json::to_string(&messages[1].blocks).unwrap();
    assert!(day2.contains("New record"));
    assert!(day2.contains("Jonas"));
    assert!(day2.contains("Siri")); // previous holder credited
}

#[tokio::test]
async fn test_at_most_one_announcement_per_day() {
    let (store, _) = started_journey("2024-03-01");
    let mut steps = walkers();
    steps.record(1, "2024-03-01", 500);
    steps.record(2, "2024-03-01", 400);
    // Day 2 beats the individual record, the group record and the
    // improvement records all at once; only one line may appear.
    steps.record(1, "2024-03-02", 800);
    steps.record(2, "2024-03-02", 700);
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-02")).await.unwrap();
    let day2 = serde_json::to_string(&messages[1].blocks).unwrap();

    // The highest-priority category (individual daily steps) wins
    assert_eq!(day2.matches("New record").count(), 1);
    assert!(day2.contains("most steps in a single day"));
    assert!(!day2.contains("whole group"));
}

#[tokio::test]
async fn test_tied_record_phrased_as_tie() {
    let (store, _) = started_journey("2024-03-01");
    let mut steps = walkers();
    steps.record(1, "2024-03-01", 700);
    steps.record(2, "2024-03-01", 300);
    steps.record(1, "2024-03-02", 700); // equals own record
    let geo = FakeGeo::with_address("Kirkegata 1, Moss", "Norway");
    let images = FakeImages::default();
    let renderer = MapRenderer::default();
    let updater = JourneyUpdater::new(&store, &steps, &geo, &images, &renderer);

    let messages = updater.run_pending_updates(date("2024-03-02")).await.unwrap();
    let day2 = serde_json::to_string(&messages[1].blocks).unwrap();
    assert!(day2.contains("matched the record"));
    assert!(!day2.contains("New record"));
}
