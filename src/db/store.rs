// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Journeys (lifecycle and waypoints)
//! - Daily step records (append-only, one row per person per day)
//! - Daily locations (append-only, one row per day)
//!
//! Each processed day is committed in a single transaction so a crash can
//! never leave a day half-written.

use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{AppError, Result};
use crate::models::{DailyLocation, DailySteps, Journey, Waypoint};
use crate::time_utils::{format_date, parse_date};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS journeys (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    origin        TEXT NOT NULL,
    destination   TEXT NOT NULL,
    distance      REAL NOT NULL,
    started_at    TEXT,
    finished_at   TEXT
);
CREATE TABLE IF NOT EXISTS waypoints (
    journey_id    INTEGER NOT NULL REFERENCES journeys(id),
    seq           INTEGER NOT NULL,
    lat           REAL NOT NULL,
    lon           REAL NOT NULL,
    elevation     REAL,
    distance      REAL NOT NULL,
    PRIMARY KEY (journey_id, seq)
);
CREATE TABLE IF NOT EXISTS steps (
    journey_id    INTEGER NOT NULL REFERENCES journeys(id),
    person_id     INTEGER NOT NULL,
    date          TEXT NOT NULL,
    amount        INTEGER NOT NULL,
    PRIMARY KEY (journey_id, person_id, date)
);
CREATE TABLE IF NOT EXISTS locations (
    journey_id         INTEGER NOT NULL REFERENCES journeys(id),
    date               TEXT NOT NULL,
    lat                REAL NOT NULL,
    lon                REAL NOT NULL,
    distance           REAL NOT NULL,
    nearest_waypoint   INTEGER NOT NULL,
    address            TEXT,
    country            TEXT,
    poi                TEXT,
    overview_image_url TEXT,
    detail_image_url   TEXT,
    PRIMARY KEY (journey_id, date)
);
";

/// Typed store for journeys, step records and locations.
pub struct JourneyStore {
    conn: Mutex<Connection>,
}

impl JourneyStore {
    /// Open (and initialize) the database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(format!("create {}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Database("connection mutex poisoned".to_string()))
    }

    // ─── Journey Operations ──────────────────────────────────────

    /// Create a journey together with its waypoints, in one transaction.
    pub fn create_journey(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[Waypoint],
    ) -> Result<i64> {
        let total = waypoints.last().map(|w| w.distance).unwrap_or_default();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO journeys (origin, destination, distance) VALUES (?1, ?2, ?3)",
            params![origin, destination, total],
        )?;
        let journey_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO waypoints (journey_id, seq, lat, lon, elevation, distance)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for w in waypoints {
                stmt.execute(params![
                    journey_id,
                    w.seq,
                    w.lat,
                    w.lon,
                    w.elevation,
                    w.distance
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(journey_id, waypoints = waypoints.len(), "Journey created");
        Ok(journey_id)
    }

    /// Get a journey by id.
    pub fn journey(&self, id: i64) -> Result<Option<Journey>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, origin, destination, distance, started_at, finished_at
             FROM journeys WHERE id = ?1",
            params![id],
            row_to_journey,
        )
        .optional()
        .map_err(Into::into)
    }

    /// The single ongoing journey (started, not finished), if any.
    pub fn ongoing_journey(&self) -> Result<Option<Journey>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, origin, destination, distance, started_at, finished_at
             FROM journeys
             WHERE started_at IS NOT NULL AND finished_at IS NULL
             ORDER BY id LIMIT 1",
            [],
            row_to_journey,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Start a journey. Fails when it is already started or when another
    /// journey is still ongoing (at most one may be ongoing at a time).
    pub fn start_journey(&self, id: i64, date: NaiveDate) -> Result<()> {
        let conn = self.lock()?;
        let ongoing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM journeys
             WHERE started_at IS NOT NULL AND finished_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        if ongoing > 0 {
            return Err(AppError::BadRequest(
                "another journey is already ongoing".to_string(),
            ));
        }
        let updated = conn.execute(
            "UPDATE journeys SET started_at = ?1
             WHERE id = ?2 AND started_at IS NULL",
            params![format_date(date), id],
        )?;
        if updated == 0 {
            return Err(AppError::BadRequest(format!(
                "journey {id} does not exist or was already started"
            )));
        }
        tracing::info!(journey_id = id, date = %date, "Journey started");
        Ok(())
    }

    /// Waypoints of a journey, in sequence order.
    pub fn waypoints(&self, journey_id: i64) -> Result<Vec<Waypoint>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT seq, lat, lon, elevation, distance
             FROM waypoints WHERE journey_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![journey_id], |row| {
            Ok(Waypoint {
                seq: row.get(0)?,
                lat: row.get(1)?,
                lon: row.get(2)?,
                elevation: row.get(3)?,
                distance: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    // ─── Step Records ────────────────────────────────────────────

    /// All step rows for a journey up to and including `date`.
    pub fn steps_up_to(&self, journey_id: i64, date: NaiveDate) -> Result<Vec<DailySteps>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT person_id, date, amount FROM steps
             WHERE journey_id = ?1 AND date <= ?2
             ORDER BY date, person_id",
        )?;
        let rows = stmt.query_map(params![journey_id, format_date(date)], row_to_steps)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    // ─── Locations ───────────────────────────────────────────────

    /// The committed location for a specific day, if that day was processed.
    pub fn location_for_date(
        &self,
        journey_id: i64,
        date: NaiveDate,
    ) -> Result<Option<DailyLocation>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT journey_id, date, lat, lon, distance, nearest_waypoint,
                    address, country, poi, overview_image_url, detail_image_url
             FROM locations WHERE journey_id = ?1 AND date = ?2",
            params![journey_id, format_date(date)],
            row_to_location,
        )
        .optional()
        .map_err(Into::into)
    }

    /// The most recent committed location: the authoritative position.
    pub fn most_recent_location(&self, journey_id: i64) -> Result<Option<DailyLocation>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT journey_id, date, lat, lon, distance, nearest_waypoint,
                    address, country, poi, overview_image_url, detail_image_url
             FROM locations WHERE journey_id = ?1
             ORDER BY date DESC LIMIT 1",
            params![journey_id],
            row_to_location,
        )
        .optional()
        .map_err(Into::into)
    }

    /// All committed locations for a journey in date order, for overview
    /// checkpoint markers.
    pub fn locations(&self, journey_id: i64) -> Result<Vec<DailyLocation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT journey_id, date, lat, lon, distance, nearest_waypoint,
                    address, country, poi, overview_image_url, detail_image_url
             FROM locations WHERE journey_id = ?1 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![journey_id], row_to_location)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    // ─── Daily Commit ────────────────────────────────────────────

    /// Commit one processed day atomically: the day's step rows, its
    /// location, and (when the route was completed) the finish date.
    ///
    /// Returns `false` without writing anything when the day was already
    /// committed, making the daily update idempotent.
    pub fn commit_day(
        &self,
        journey_id: i64,
        date: NaiveDate,
        steps: &[DailySteps],
        location: &DailyLocation,
        finished: bool,
    ) -> Result<bool> {
        let date_text = format_date(date);
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM locations WHERE journey_id = ?1 AND date = ?2",
            params![journey_id, date_text],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(false);
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO steps (journey_id, person_id, date, amount)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for s in steps {
                stmt.execute(params![journey_id, s.person_id, date_text, s.amount])?;
            }
        }

        tx.execute(
            "INSERT INTO locations (journey_id, date, lat, lon, distance, nearest_waypoint,
                                    address, country, poi, overview_image_url, detail_image_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                journey_id,
                date_text,
                location.lat,
                location.lon,
                location.distance_meters,
                location.nearest_waypoint,
                location.address,
                location.country,
                location.poi,
                location.overview_image_url,
                location.detail_image_url,
            ],
        )?;

        if finished {
            tx.execute(
                "UPDATE journeys SET finished_at = ?1
                 WHERE id = ?2 AND finished_at IS NULL",
                params![date_text, journey_id],
            )?;
        }

        tx.commit()?;
        tracing::info!(journey_id, date = %date, finished, "Day committed");
        Ok(true)
    }
}

// ─── Row Mapping ─────────────────────────────────────────────────

fn row_to_journey(row: &rusqlite::Row<'_>) -> rusqlite::Result<Journey> {
    Ok(Journey {
        id: row.get(0)?,
        origin: row.get(1)?,
        destination: row.get(2)?,
        distance_meters: row.get(3)?,
        started_at: date_column(row, 4)?,
        finished_at: date_column(row, 5)?,
    })
}

fn row_to_steps(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailySteps> {
    Ok(DailySteps {
        person_id: row.get(0)?,
        date: required_date(row, 1)?,
        amount: row.get(2)?,
    })
}

fn row_to_location(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyLocation> {
    Ok(DailyLocation {
        journey_id: row.get(0)?,
        date: required_date(row, 1)?,
        lat: row.get(2)?,
        lon: row.get(3)?,
        distance_meters: row.get(4)?,
        nearest_waypoint: row.get(5)?,
        address: row.get(6)?,
        country: row.get(7)?,
        poi: row.get(8)?,
        overview_image_url: row.get(9)?,
        detail_image_url: row.get(10)?,
    })
}

fn date_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(index)?;
    match text {
        None => Ok(None),
        Some(value) => parse_date(&value).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                format!("invalid date: {value}").into(),
            )
        }),
    }
}

fn required_date(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<NaiveDate> {
    date_column(row, index)?.ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Null,
            "unexpected NULL date".into(),
        )
    })
}
