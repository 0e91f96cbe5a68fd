// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily journey update service.
//!
//! Handles the core workflow, once per unprocessed day:
//! 1. Collect each participant's steps from the step provider
//! 2. Advance the journey position along the route
//! 3. Resolve the new position (address, country, point of interest)
//! 4. Render and upload the overview and detail maps
//! 5. Detect the day's record, if any
//! 6. Commit the day atomically and compose the report
//!
//! Days are processed strictly in date order and each day is fully
//! committed before the next one starts; a day without step data ends the
//! run and is retried on the next invocation.

use chrono::NaiveDate;

use crate::db::JourneyStore;
use crate::error::{AppError, Result};
use crate::models::{DailyLocation, DailySteps, Journey, Person};
use crate::services::achievements::AchievementEngine;
use crate::services::fitness::StepSource;
use crate::services::geo_lookup::GeoLookup;
use crate::services::map::{DetailSegment, MapRenderer};
use crate::services::narrative::{self, DailyReport, Narrative};
use crate::services::progress;
use crate::services::route::{RouteError, RoutePath};
use crate::services::storage::ImageStore;
use crate::time_utils::days_inclusive;

/// What one committed day produced.
struct DayOutcome {
    narratives: Vec<Narrative>,
    finished: bool,
}

/// Drives the daily update against the store and the collaborators.
pub struct JourneyUpdater<'a, S, G, I> {
    store: &'a JourneyStore,
    steps: &'a S,
    geo: &'a G,
    images: &'a I,
    renderer: &'a MapRenderer,
    engine: AchievementEngine,
}

impl<'a, S, G, I> JourneyUpdater<'a, S, G, I>
where
    S: StepSource,
    G: GeoLookup,
    I: ImageStore,
{
    pub fn new(
        store: &'a JourneyStore,
        steps: &'a S,
        geo: &'a G,
        images: &'a I,
        renderer: &'a MapRenderer,
    ) -> Self {
        Self {
            store,
            steps,
            geo,
            images,
            renderer,
            engine: AchievementEngine::default(),
        }
    }

    /// Process every unprocessed day up to and including `today`.
    ///
    /// Returns the composed report messages in date order. Idempotent per
    /// day: already-committed days are skipped, and a rerun for a fully
    /// processed period returns no messages.
    pub async fn run_pending_updates(&self, today: NaiveDate) -> Result<Vec<Narrative>> {
        let Some(journey) = self.store.ongoing_journey()? else {
            tracing::debug!("No ongoing journey; nothing to update");
            return Ok(Vec::new());
        };
        let Some(started_at) = journey.started_at else {
            return Err(AppError::Database(format!(
                "journey {} is ongoing but has no start date",
                journey.id
            )));
        };

        let route = RoutePath::new(self.store.waypoints(journey.id)?).map_err(route_err)?;
        let participants = self.steps.enabled_participants().await?;

        let first_unprocessed = match self.store.most_recent_location(journey.id)? {
            Some(latest) => latest
                .date
                .succ_opt()
                .ok_or_else(|| AppError::Database("date overflow".to_string()))?,
            None => started_at,
        };

        let mut messages = Vec::new();
        for date in days_inclusive(first_unprocessed, today) {
            if self.store.location_for_date(journey.id, date)?.is_some() {
                tracing::debug!(journey_id = journey.id, %date, "Day already recorded; skipping");
                continue;
            }

            match self.process_day(&journey, &route, &participants, date).await? {
                Some(outcome) => {
                    messages.extend(outcome.narratives);
                    if outcome.finished {
                        tracing::info!(journey_id = journey.id, %date, "Journey finished");
                        break;
                    }
                }
                None => {
                    tracing::info!(
                        journey_id = journey.id,
                        %date,
                        "No step data for day; deferring it and later days to the next run"
                    );
                    break;
                }
            }
        }
        Ok(messages)
    }

    /// Process a single day. Returns `None` when the day contributed no
    /// steps (the day stays unprocessed), or the committed day's outcome.
    async fn process_day(
        &self,
        journey: &Journey,
        route: &RoutePath,
        participants: &[Person],
        date: NaiveDate,
    ) -> Result<Option<DayOutcome>> {
        let day_steps = self.collect_steps(participants, date).await;

        let previous = self.store.most_recent_location(journey.id)?;
        let prev_total = previous
            .as_ref()
            .map(|l| l.distance_meters)
            .unwrap_or_default();

        let Some(advance) =
            progress::advance(route, journey.state(), prev_total, &day_steps).map_err(route_err)?
        else {
            return Ok(None);
        };
        let segments =
            progress::apportion_segments(route, prev_total, &day_steps).map_err(route_err)?;

        // Position lookups are best-effort; a failed call only blanks the
        // corresponding report line.
        let resolved = match self
            .geo
            .reverse_geocode(advance.position.lat, advance.position.lon)
            .await
        {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(error = %err, "Reverse geocoding failed");
                None
            }
        };
        let new_country = progress::crossed_border(
            previous.as_ref().and_then(|l| l.country.as_deref()),
            resolved.as_ref().and_then(|r| r.country.as_deref()),
        );
        let poi = match self
            .geo
            .nearby_point_of_interest(advance.position.lat, advance.position.lon)
            .await
        {
            Ok(poi) => poi,
            Err(err) => {
                tracing::warn!(error = %err, "Point-of-interest lookup failed");
                None
            }
        };

        let (overview_url, detail_url) = self
            .render_and_upload(journey, route, &advance, &segments, participants, date)
            .await;

        // Record detection runs over stored history plus today's rows,
        // which are committed together below.
        let mut history = self.store.steps_up_to(journey.id, date)?;
        history.extend(day_steps.iter().cloned());
        let names: std::collections::HashMap<i64, String> = participants
            .iter()
            .map(|p| (p.id, p.first_name.clone()))
            .collect();
        let achievement = self
            .engine
            .daily_record(&history, date)
            .map(|(category, event)| self.engine.describe(category, &event, &names));

        let day_number = journey
            .started_at
            .map(|started| (date - started).num_days() + 1)
            .unwrap_or(1);

        let location = DailyLocation {
            journey_id: journey.id,
            date,
            lat: advance.position.lat,
            lon: advance.position.lon,
            distance_meters: advance.new_total,
            nearest_waypoint: advance.position.nearest_waypoint,
            address: resolved.as_ref().map(|r| r.address.clone()),
            country: resolved.as_ref().and_then(|r| r.country.clone()),
            poi: poi.as_ref().map(|p| p.name.clone()),
            overview_image_url: overview_url.clone(),
            detail_image_url: detail_url.clone(),
        };

        let committed =
            self.store
                .commit_day(journey.id, date, &day_steps, &location, advance.finished)?;
        if !committed {
            tracing::debug!(journey_id = journey.id, %date, "Day was committed concurrently");
            return Ok(Some(DayOutcome {
                narratives: Vec::new(),
                finished: false,
            }));
        }

        let report = DailyReport {
            day_number,
            origin: journey.origin.clone(),
            destination: journey.destination.clone(),
            steps: day_steps
                .iter()
                .map(|s| {
                    let name = names
                        .get(&s.person_id)
                        .cloned()
                        .unwrap_or_else(|| format!("#{}", s.person_id));
                    (name, s.amount)
                })
                .collect(),
            distance_today_meters: advance.distance_today,
            distance_total_meters: advance.new_total,
            route_distance_meters: route.total_distance(),
            achievement,
            address: location.address.clone(),
            country: location.country.clone(),
            new_country,
            poi: location.poi.clone(),
            overview_image_url: overview_url,
            detail_image_url: detail_url,
        };

        let mut narratives = vec![narrative::daily_report(&report)];
        if advance.finished {
            narratives.push(narrative::finish_report(
                &journey.origin,
                &journey.destination,
                day_number,
                route.total_distance(),
            ));
        }
        Ok(Some(DayOutcome {
            narratives,
            finished: advance.finished,
        }))
    }

    /// Fetch each participant's steps, skipping failures and empty days.
    ///
    /// A zero step count is treated the same as missing data: the person
    /// simply does not contribute to the day.
    async fn collect_steps(&self, participants: &[Person], date: NaiveDate) -> Vec<DailySteps> {
        let mut rows = Vec::new();
        for person in participants {
            match self.steps.steps_for(person, date).await {
                Ok(Some(amount)) if amount > 0 => rows.push(DailySteps {
                    person_id: person.id,
                    date,
                    amount,
                }),
                Ok(_) => {
                    tracing::debug!(person_id = person.id, %date, "No steps recorded");
                }
                Err(err) => {
                    tracing::warn!(
                        person_id = person.id,
                        %date,
                        error = %err,
                        "Step provider call failed; skipping person"
                    );
                }
            }
        }
        rows
    }

    /// Render both maps and upload whatever rendered. Every failure along
    /// the way degrades to "no image" instead of failing the day.
    async fn render_and_upload(
        &self,
        journey: &Journey,
        route: &RoutePath,
        advance: &progress::DayAdvance,
        segments: &[progress::PersonSegment],
        participants: &[Person],
        date: NaiveDate,
    ) -> (Option<String>, Option<String>) {
        let mut traveled: Vec<(f64, f64)> = route
            .slice(0.0, advance.new_total)
            .iter()
            .map(|w| (w.lat, w.lon))
            .collect();
        traveled.push((advance.position.lat, advance.position.lon));

        let today: Vec<(f64, f64)> = segments.iter().flat_map(|s| s.points.clone()).collect();

        let checkpoints: Vec<(f64, f64)> = match self.store.locations(journey.id) {
            Ok(locations) => locations.iter().map(|l| (l.lat, l.lon)).collect(),
            Err(err) => {
                tracing::warn!(error = %err, "Could not load checkpoint markers");
                Vec::new()
            }
        };

        let detail_segments: Vec<DetailSegment> = segments
            .iter()
            .map(|segment| {
                let person = participants.iter().find(|p| p.id == segment.person_id);
                DetailSegment {
                    name: person
                        .map(|p| p.first_name.clone())
                        .unwrap_or_else(|| format!("#{}", segment.person_id)),
                    color_hex: person.and_then(|p| p.color_hex.clone()),
                    points: segment.points.clone(),
                }
            })
            .collect();

        let overview_png = self
            .renderer
            .overview_with_retry(&traveled, &today, &checkpoints);
        let detail_png = self.renderer.detail_with_retry(&detail_segments);

        let overview_url = match overview_png {
            Some(bytes) => {
                self.upload_image(&bytes, &format!("journeys/{}/{date}-overview.png", journey.id))
                    .await
            }
            None => None,
        };
        let detail_url = match detail_png {
            Some(bytes) => {
                self.upload_image(&bytes, &format!("journeys/{}/{date}-detail.png", journey.id))
                    .await
            }
            None => None,
        };
        (overview_url, detail_url)
    }

    async fn upload_image(&self, bytes: &[u8], path: &str) -> Option<String> {
        match self.images.upload(bytes, path).await {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(path, error = %err, "Image upload failed");
                None
            }
        }
    }
}

/// On-demand weigh-in lines for the slash command.
pub async fn collect_weights<S: StepSource>(
    steps: &S,
    participants: &[Person],
    date: NaiveDate,
) -> Vec<(String, Option<f64>)> {
    let mut entries = Vec::new();
    for person in participants {
        let weight = match steps.body_metrics_for(person, date).await {
            Ok(Some(metrics)) => metrics.weight_kg,
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(person_id = person.id, error = %err, "Body metrics call failed");
                None
            }
        };
        entries.push((person.first_name.clone(), weight));
    }
    entries
}

fn route_err(err: RouteError) -> AppError {
    AppError::Internal(err.into())
}
