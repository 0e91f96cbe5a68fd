// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fixtures: an in-memory store and fake collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::NaiveDate;
use trek_tracker::db::JourneyStore;
use trek_tracker::error::{AppError, Result};
use trek_tracker::models::{Person, Waypoint};
use trek_tracker::services::fitness::{BodyMetrics, StepSource};
use trek_tracker::services::geo_lookup::{GeoLookup, PointOfInterest, ResolvedAddress};
use trek_tracker::services::storage::ImageStore;
use trek_tracker::time_utils::parse_date;

#[allow(dead_code)]
pub fn date(value: &str) -> NaiveDate {
    parse_date(value).expect("valid test date")
}

/// Waypoints at cumulative distances 0, 1000 and 3000 meters.
#[allow(dead_code)]
pub fn short_route() -> Vec<Waypoint> {
    vec![
        Waypoint {
            seq: 0,
            lat: 59.0,
            lon: 10.0,
            elevation: None,
            distance: 0.0,
        },
        Waypoint {
            seq: 1,
            lat: 59.01,
            lon: 10.0,
            elevation: None,
            distance: 1000.0,
        },
        Waypoint {
            seq: 2,
            lat: 59.03,
            lon: 10.0,
            elevation: None,
            distance: 3000.0,
        },
    ]
}

/// A started journey over [`short_route`] in a fresh in-memory store.
#[allow(dead_code)]
pub fn started_journey(start: &str) -> (JourneyStore, i64) {
    let store = JourneyStore::open_in_memory().expect("in-memory store");
    let id = store
        .create_journey("Larkollen", "Lindesnes", &short_route())
        .expect("create journey");
    store.start_journey(id, date(start)).expect("start journey");
    (store, id)
}

#[allow(dead_code)]
pub fn person(id: i64, name: &str) -> Person {
    Person {
        id,
        first_name: name.to_string(),
        color_hex: Some("#1e90ff".to_string()),
    }
}

/// Step provider fake fed from a fixture map.
pub struct FakeSteps {
    pub participants: Vec<Person>,
    pub steps: HashMap<(i64, NaiveDate), u32>,
    /// Person ids whose provider calls fail
    pub failing: HashSet<i64>,
    pub weights: HashMap<i64, f64>,
}

impl FakeSteps {
    #[allow(dead_code)]
    pub fn new(participants: Vec<Person>) -> Self {
        Self {
            participants,
            steps: HashMap::new(),
            failing: HashSet::new(),
            weights: HashMap::new(),
        }
    }

    #[allow(dead_code)]
    pub fn record(&mut self, person_id: i64, day: &str, amount: u32) {
        self.steps.insert((person_id, date(day)), amount);
    }
}

impl StepSource for FakeSteps {
    async fn enabled_participants(&self) -> Result<Vec<Person>> {
        Ok(self.participants.clone())
    }

    async fn steps_for(&self, person: &Person, day: NaiveDate) -> Result<Option<u32>> {
        if self.failing.contains(&person.id) {
            return Err(AppError::StepProvider("provider timeout".to_string()));
        }
        Ok(self.steps.get(&(person.id, day)).copied())
    }

    async fn body_metrics_for(&self, person: &Person, _day: NaiveDate) -> Result<Option<BodyMetrics>> {
        Ok(self.weights.get(&person.id).map(|&weight| BodyMetrics {
            weight_kg: Some(weight),
            fat_percent: None,
        }))
    }
}

/// Geo fake returning one fixed address, optionally failing.
pub struct FakeGeo {
    pub address: Option<ResolvedAddress>,
    pub poi: Option<String>,
    pub failing: bool,
}

impl FakeGeo {
    #[allow(dead_code)]
    pub fn with_address(address: &str, country: &str) -> Self {
        Self {
            address: Some(ResolvedAddress {
                address: address.to_string(),
                country: Some(country.to_string()),
            }),
            poi: None,
            failing: false,
        }
    }
}

impl GeoLookup for FakeGeo {
    async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<Option<ResolvedAddress>> {
        if self.failing {
            return Err(AppError::GeoLookup("geocoder down".to_string()));
        }
        Ok(self.address.clone())
    }

    async fn nearby_point_of_interest(
        &self,
        _lat: f64,
        _lon: f64,
    ) -> Result<Option<PointOfInterest>> {
        if self.failing {
            return Err(AppError::GeoLookup("places down".to_string()));
        }
        Ok(self.poi.clone().map(|name| PointOfInterest {
            name,
            photo: None,
        }))
    }
}

/// Image store fake recording uploaded paths.
#[derive(Default)]
pub struct FakeImages {
    pub uploaded: Mutex<Vec<String>>,
}

impl ImageStore for FakeImages {
    async fn upload(&self, _bytes: &[u8], path: &str) -> Result<String> {
        self.uploaded
            .lock()
            .expect("uploads mutex")
            .push(path.to_string());
        Ok(format!("https://img.example/{path}"))
    }
}
