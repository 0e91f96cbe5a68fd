// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily journey advancement.
//!
//! One transition per calendar day with step data: the day's collected
//! steps become distance, the position moves along the route, and the
//! day's movement is decomposed into per-person stretches for the detail
//! map.

use crate::models::{DailySteps, JourneyState};
use crate::services::route::{RouteError, RoutePath, RoutePosition};

/// Outcome of advancing a journey by one day of steps.
#[derive(Debug, Clone)]
pub struct DayAdvance {
    /// Distance covered by today's steps, in meters
    pub distance_today: f64,
    /// Cumulative traveled distance after today, in meters
    pub new_total: f64,
    pub position: RoutePosition,
    /// True when the new total reaches the end of the route
    pub finished: bool,
}

/// One person's traveled stretch of the route for a single day.
#[derive(Debug, Clone)]
pub struct PersonSegment {
    pub person_id: i64,
    pub start_distance: f64,
    pub end_distance: f64,
    /// (lat, lon) polyline: interpolated start, crossed waypoints,
    /// interpolated end
    pub points: Vec<(f64, f64)>,
}

/// Advance a journey by one day's collected steps.
///
/// Returns `None` when there is nothing to do: the journey is not ongoing,
/// or the day contributed no steps. Callers must treat `None` as "skip the
/// day", not as an error.
pub fn advance(
    route: &RoutePath,
    state: JourneyState,
    prev_total: f64,
    day_steps: &[DailySteps],
) -> Result<Option<DayAdvance>, RouteError> {
    if state != JourneyState::Ongoing {
        return Ok(None);
    }

    let distance_today: f64 = day_steps.iter().map(DailySteps::distance_meters).sum();
    if distance_today <= 0.0 {
        return Ok(None);
    }

    let new_total = prev_total + distance_today;
    let position = route.position_at(new_total)?;

    Ok(Some(DayAdvance {
        distance_today,
        new_total,
        finished: position.finished,
        position,
    }))
}

/// Decompose a day's movement into one route stretch per contributor.
///
/// Contributors are laid end to end along the route in descending step
/// order: the biggest contributor walks first from `start_distance`, the
/// next one continues where they stopped, and so on. Each stretch follows
/// the route geometry, crossing waypoints as needed.
pub fn apportion_segments(
    route: &RoutePath,
    start_distance: f64,
    day_steps: &[DailySteps],
) -> Result<Vec<PersonSegment>, RouteError> {
    let mut ranked: Vec<&DailySteps> = day_steps.iter().filter(|s| s.amount > 0).collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.person_id.cmp(&b.person_id)));

    let mut segments = Vec::with_capacity(ranked.len());
    let mut cursor = start_distance;
    for steps in ranked {
        let end = cursor + steps.distance_meters();

        let mut points = Vec::new();
        let start_pos = route.position_at(cursor)?;
        points.push((start_pos.lat, start_pos.lon));
        for waypoint in route.slice(cursor, end) {
            if waypoint.distance > cursor && waypoint.distance < end {
                points.push((waypoint.lat, waypoint.lon));
            }
        }
        let end_pos = route.position_at(end)?;
        points.push((end_pos.lat, end_pos.lon));

        segments.push(PersonSegment {
            person_id: steps.person_id,
            start_distance: cursor,
            end_distance: end,
            points,
        });
        cursor = end;
    }

    Ok(segments)
}

/// Whether the journey crossed into a new country today.
///
/// Only reported when both days resolved a country and they differ; a
/// failed geocoding on either side never counts as a border crossing.
pub fn crossed_border(previous: Option<&str>, current: Option<&str>) -> bool {
    matches!((previous, current), (Some(prev), Some(cur)) if prev != cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;
    use crate::time_utils::parse_date;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        parse_date("2024-03-05").unwrap()
    }

    fn steps(person_id: i64, amount: u32) -> DailySteps {
        DailySteps {
            person_id,
            date: date(),
            amount,
        }
    }

    fn waypoint(seq: u32, lat: f64, lon: f64, distance: f64) -> Waypoint {
        Waypoint {
            seq,
            lat,
            lon,
            elevation: None,
            distance,
        }
    }

    /// Three waypoints at cumulative distances 0, 1000 and 3000 meters.
    fn route() -> RoutePath {
        RoutePath::new(vec![
            waypoint(0, 59.0, 10.0, 0.0),
            waypoint(1, 59.01, 10.0, 1000.0),
            waypoint(2, 59.03, 10.0, 3000.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_advance_interpolates_today() {
        // Stored 500 m, two people walk 1000 steps in total => 750 m more
        let day = [steps(1, 600), steps(2, 400)];
        let advance = advance(&route(), JourneyState::Ongoing, 500.0, &day)
            .unwrap()
            .expect("should advance");

        assert_eq!(advance.distance_today, 750.0);
        assert_eq!(advance.new_total, 1250.0);
        assert_eq!(advance.position.nearest_waypoint, 1);
        assert!(!advance.finished);
    }

    #[test]
    fn test_advance_reaches_destination() {
        // 2900 m stored; anything contributing >= 100 m finishes the route
        let day = [steps(1, 200)]; // 150 m
        let advance = advance(&route(), JourneyState::Ongoing, 2900.0, &day)
            .unwrap()
            .expect("should advance");

        assert!(advance.finished);
        assert!(advance.new_total >= 3000.0);
        assert_eq!(advance.position.lat, 59.03);
    }

    #[test]
    fn test_advance_noop_when_not_ongoing() {
        let day = [steps(1, 1000)];
        for state in [JourneyState::NotStarted, JourneyState::Finished] {
            assert!(advance(&route(), state, 0.0, &day).unwrap().is_none());
        }
    }

    #[test]
    fn test_advance_noop_without_steps() {
        assert!(advance(&route(), JourneyState::Ongoing, 0.0, &[])
            .unwrap()
            .is_none());
        assert!(
            advance(&route(), JourneyState::Ongoing, 0.0, &[steps(1, 0)])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_apportion_lays_people_end_to_end() {
        let day = [steps(1, 400), steps(2, 600)];
        let segments = apportion_segments(&route(), 500.0, &day).unwrap();

        assert_eq!(segments.len(), 2);
        // Descending step order: person 2 walks first
        assert_eq!(segments[0].person_id, 2);
        assert_eq!(segments[0].start_distance, 500.0);
        assert_eq!(segments[0].end_distance, 950.0);
        assert_eq!(segments[1].person_id, 1);
        assert_eq!(segments[1].start_distance, 950.0);
        assert_eq!(segments[1].end_distance, 1250.0);
    }

    #[test]
    fn test_apportion_crosses_waypoints() {
        // One person walks from 500 m to 2000 m, crossing the 1000 m waypoint
        let day = [steps(1, 2000)];
        let segments = apportion_segments(&route(), 500.0, &day).unwrap();

        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.points.len(), 3); // start, waypoint 1, end
        assert_eq!(seg.points[1], (59.01, 10.0));
    }

    #[test]
    fn test_apportion_skips_zero_contributors() {
        let day = [steps(1, 0), steps(2, 100)];
        let segments = apportion_segments(&route(), 0.0, &day).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].person_id, 2);
    }

    #[test]
    fn test_crossed_border() {
        assert!(crossed_border(Some("Sweden"), Some("Norway")));
        assert!(!crossed_border(Some("Norway"), Some("Norway")));
        assert!(!crossed_border(None, Some("Norway")));
        assert!(!crossed_border(Some("Norway"), None));
        assert!(!crossed_border(None, None));
    }
}
