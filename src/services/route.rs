// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route loading and geodesic position interpolation.
//!
//! A route is a fixed, ordered sequence of waypoints parsed from an
//! uploaded track (GeoJSON LineString or encoded polyline). Each waypoint
//! carries its cumulative distance from the origin, which lets us resolve
//! "where is the journey after X meters" with a single lookup plus a
//! great-circle destination calculation.

use crate::models::Waypoint;
use geo::{Bearing, Destination, Distance, Haversine, Point};
use geojson::GeoJson;

/// A pre-recorded route as ordered waypoints with cumulative distances.
#[derive(Debug, Clone)]
pub struct RoutePath {
    waypoints: Vec<Waypoint>,
}

/// A position resolved on the route at some traveled distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePosition {
    pub lat: f64,
    pub lon: f64,
    /// Sequence number of the last waypoint at or before the position
    pub nearest_waypoint: u32,
    /// True when the distance reaches or passes the end of the route
    pub finished: bool,
}

impl RoutePath {
    /// Build a route from already-computed waypoints.
    ///
    /// The sequence must have at least two points, start at distance 0,
    /// and have non-decreasing cumulative distances.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooShort(waypoints.len()));
        }
        if waypoints[0].distance != 0.0 {
            return Err(RouteError::CorruptSequence {
                seq: waypoints[0].seq,
            });
        }
        for pair in waypoints.windows(2) {
            if pair[1].distance < pair[0].distance {
                return Err(RouteError::CorruptSequence { seq: pair[1].seq });
            }
        }
        Ok(Self { waypoints })
    }

    /// Parse a route from a GeoJSON LineString (bare geometry, feature, or
    /// the first feature of a collection).
    pub fn from_geojson(json_data: &str) -> Result<Self, RouteError> {
        let geojson: GeoJson = json_data
            .parse()
            .map_err(|e: geojson::Error| RouteError::ParseError(e.to_string()))?;

        let value = match geojson {
            GeoJson::Geometry(geometry) => geometry.value,
            GeoJson::Feature(feature) => feature.geometry.ok_or(RouteError::MissingTrack)?.value,
            GeoJson::FeatureCollection(collection) => {
                collection
                    .features
                    .into_iter()
                    .find_map(|f| f.geometry)
                    .ok_or(RouteError::MissingTrack)?
                    .value
            }
        };

        match value {
            geojson::Value::LineString(positions) => {
                let mut coords = Vec::with_capacity(positions.len());
                for position in &positions {
                    match position.as_slice() {
                        [lon, lat, rest @ ..] => coords.push((*lat, *lon, rest.first().copied())),
                        _ => return Err(RouteError::ParseError("position too short".to_string())),
                    }
                }
                Self::from_coords(coords)
            }
            _ => Err(RouteError::UnsupportedGeometry),
        }
    }

    /// Parse a route from an encoded polyline (precision 5).
    pub fn from_polyline(encoded: &str) -> Result<Self, RouteError> {
        let line = polyline::decode_polyline(encoded, 5)
            .map_err(|e| RouteError::PolylineError(e.to_string()))?;
        let coords = line.coords().map(|c| (c.y, c.x, None)).collect();
        Self::from_coords(coords)
    }

    /// Build waypoints from (lat, lon, elevation) triples, accumulating
    /// great-circle distances between consecutive points.
    fn from_coords(coords: Vec<(f64, f64, Option<f64>)>) -> Result<Self, RouteError> {
        if coords.len() < 2 {
            return Err(RouteError::TooShort(coords.len()));
        }

        let mut waypoints = Vec::with_capacity(coords.len());
        let mut cumulative = 0.0;
        let mut previous: Option<Point<f64>> = None;
        for (seq, (lat, lon, elevation)) in coords.into_iter().enumerate() {
            let point = Point::new(lon, lat);
            if let Some(prev) = previous {
                cumulative += Haversine.distance(prev, point);
            }
            previous = Some(point);
            waypoints.push(Waypoint {
                seq: seq as u32,
                lat,
                lon,
                elevation,
                distance: cumulative,
            });
        }
        Self::new(waypoints)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Total route length in meters.
    pub fn total_distance(&self) -> f64 {
        self.waypoints
            .last()
            .map(|w| w.distance)
            .unwrap_or_default()
    }

    /// Resolve the geographic position after traveling `distance` meters
    /// from the origin.
    ///
    /// Finds the last waypoint whose cumulative distance is at or below the
    /// target, then projects the remaining meters along the great-circle
    /// bearing towards the next waypoint. At or past the end of the route
    /// the last waypoint is returned with `finished = true`.
    pub fn position_at(&self, distance: f64) -> Result<RoutePosition, RouteError> {
        if distance < 0.0 {
            return Err(RouteError::DistanceOutOfRange(distance));
        }

        let upper = self.waypoints.partition_point(|w| w.distance <= distance);
        let latest = &self.waypoints[upper - 1];

        let Some(next) = self.waypoints.get(upper) else {
            return Ok(RoutePosition {
                lat: latest.lat,
                lon: latest.lon,
                nearest_waypoint: latest.seq,
                finished: true,
            });
        };

        let remaining = distance - latest.distance;
        if remaining == 0.0 {
            // Exactly on a waypoint; skip the projection so coordinates
            // match the stored track bit for bit.
            return Ok(RoutePosition {
                lat: latest.lat,
                lon: latest.lon,
                nearest_waypoint: latest.seq,
                finished: false,
            });
        }

        let start = Point::new(latest.lon, latest.lat);
        let end = Point::new(next.lon, next.lat);
        let bearing = Haversine.bearing(start, end);
        let projected = Haversine.destination(start, bearing, remaining);

        Ok(RoutePosition {
            lat: projected.y(),
            lon: projected.x(),
            nearest_waypoint: latest.seq,
            finished: false,
        })
    }

    /// Waypoints whose cumulative distance lies within `[low, high]`.
    ///
    /// Used to reconstruct traveled path geometry for rendering and for
    /// per-person segment decomposition.
    pub fn slice(&self, low: f64, high: f64) -> &[Waypoint] {
        let start = self.waypoints.partition_point(|w| w.distance < low);
        let end = self.waypoints.partition_point(|w| w.distance <= high);
        &self.waypoints[start..end.max(start)]
    }
}

/// Errors from route parsing and position lookups.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Failed to parse route: {0}")]
    ParseError(String),

    #[error("Track file contains no geometry")]
    MissingTrack,

    #[error("Unsupported geometry type (expected LineString)")]
    UnsupportedGeometry,

    #[error("Route needs at least two points, got {0}")]
    TooShort(usize),

    #[error("Corrupt waypoint sequence at waypoint {seq}")]
    CorruptSequence { seq: u32 },

    #[error("Distance {0} is outside the route")]
    DistanceOutOfRange(f64),

    #[error("Failed to decode polyline: {0}")]
    PolylineError(String),
}
