// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map rendering.
//!
//! Two raster images per processed day: an overview of the whole traveled
//! path and a zoomed detail of today's per-person stretches. Rendering is
//! best-effort; a failed render is retried once and then reported as "no
//! image" so the day's update is never blocked on drawing.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use plotters::prelude::*;

/// Distinct fallback colors for people without a configured one.
const PALETTE: &[RGBColor] = &[
    RGBColor(30, 144, 255),
    RGBColor(34, 139, 34),
    RGBColor(200, 0, 100),
    RGBColor(255, 140, 0),
    RGBColor(106, 90, 205),
    RGBColor(0, 139, 139),
];

static RENDER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One person's colored stretch on the detail map.
#[derive(Debug, Clone)]
pub struct DetailSegment {
    pub name: String,
    pub color_hex: Option<String>,
    /// (lat, lon) polyline of the stretch
    pub points: Vec<(f64, f64)>,
}

/// Renders journey maps as PNG bytes.
#[derive(Debug, Clone)]
pub struct MapRenderer {
    width: u32,
    height: u32,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl MapRenderer {
    /// Render the overview: full traveled path, today's stretch on top,
    /// and a marker at each known daily checkpoint.
    pub fn render_overview(
        &self,
        traveled: &[(f64, f64)],
        today: &[(f64, f64)],
        checkpoints: &[(f64, f64)],
    ) -> Result<Vec<u8>, MapError> {
        let all: Vec<(f64, f64)> = traveled.iter().chain(today.iter()).copied().collect();
        let (x_range, y_range) = bounds(&all).ok_or(MapError::NoGeometry)?;

        let path = scratch_path("overview");
        {
            let root =
                BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(12)
                .build_cartesian_2d(x_range, y_range)
                .map_err(draw_err)?;

            chart
                .draw_series(LineSeries::new(
                    traveled.iter().map(|p| lonlat(*p)),
                    RGBColor(90, 90, 90).stroke_width(2),
                ))
                .map_err(draw_err)?;

            chart
                .draw_series(LineSeries::new(
                    today.iter().map(|p| lonlat(*p)),
                    RGBColor(200, 0, 100).stroke_width(4),
                ))
                .map_err(draw_err)?;

            chart
                .draw_series(
                    checkpoints
                        .iter()
                        .map(|p| Circle::new(lonlat(*p), 3, RGBColor(90, 90, 90).filled())),
                )
                .map_err(draw_err)?;

            if let Some(end) = today.last() {
                chart
                    .draw_series(std::iter::once(Circle::new(
                        lonlat(*end),
                        6,
                        RGBColor(200, 0, 100).filled(),
                    )))
                    .map_err(draw_err)?;
            }

            root.present().map_err(draw_err)?;
        }
        read_and_remove(&path)
    }

    /// Render the detail map: one colored stretch per person with start
    /// and end markers and a name legend.
    pub fn render_detail(&self, segments: &[DetailSegment]) -> Result<Vec<u8>, MapError> {
        let all: Vec<(f64, f64)> = segments.iter().flat_map(|s| s.points.clone()).collect();
        let (x_range, y_range) = bounds(&all).ok_or(MapError::NoGeometry)?;

        let path = scratch_path("detail");
        {
            let root =
                BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(12)
                .build_cartesian_2d(x_range, y_range)
                .map_err(draw_err)?;

            for (index, segment) in segments.iter().enumerate() {
                let color = segment_color(segment.color_hex.as_deref(), index);
                chart
                    .draw_series(LineSeries::new(
                        segment.points.iter().map(|p| lonlat(*p)),
                        color.stroke_width(4),
                    ))
                    .map_err(draw_err)?
                    .label(segment.name.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(4))
                    });

                if let Some(start) = segment.points.first() {
                    chart
                        .draw_series(std::iter::once(Circle::new(
                            lonlat(*start),
                            4,
                            color.filled(),
                        )))
                        .map_err(draw_err)?;
                }
            }

            if let Some(end) = segments.last().and_then(|s| s.points.last()) {
                chart
                    .draw_series(std::iter::once(Circle::new(
                        lonlat(*end),
                        7,
                        BLACK.filled(),
                    )))
                    .map_err(draw_err)?;
            }

            // Legend text needs a registered font; without one the map is
            // still usable, so a failed legend never fails the render.
            if let Err(err) = chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()
            {
                tracing::debug!(error = %err, "Legend unavailable; rendering without labels");
            }

            root.present().map_err(draw_err)?;
        }
        read_and_remove(&path)
    }

    /// Render with a single retry; `None` means "no image available".
    pub fn overview_with_retry(
        &self,
        traveled: &[(f64, f64)],
        today: &[(f64, f64)],
        checkpoints: &[(f64, f64)],
    ) -> Option<Vec<u8>> {
        retry_once("overview", || {
            self.render_overview(traveled, today, checkpoints)
        })
    }

    /// Render with a single retry; `None` means "no image available".
    pub fn detail_with_retry(&self, segments: &[DetailSegment]) -> Option<Vec<u8>> {
        retry_once("detail", || self.render_detail(segments))
    }
}

fn retry_once<F>(kind: &str, render: F) -> Option<Vec<u8>>
where
    F: Fn() -> Result<Vec<u8>, MapError>,
{
    for attempt in 1..=2 {
        match render() {
            Ok(bytes) => return Some(bytes),
            Err(err) => {
                tracing::warn!(kind, attempt, error = %err, "Map render failed");
            }
        }
    }
    None
}

/// Plotters wants (x, y) = (lon, lat).
fn lonlat((lat, lon): (f64, f64)) -> (f64, f64) {
    (lon, lat)
}

/// Bounding ranges with a margin, or `None` for empty input.
fn bounds(points: &[(f64, f64)]) -> Option<(std::ops::Range<f64>, std::ops::Range<f64>)> {
    let first = points.first()?;
    let mut min_lat = first.0;
    let mut max_lat = first.0;
    let mut min_lon = first.1;
    let mut max_lon = first.1;
    for (lat, lon) in points {
        min_lat = min_lat.min(*lat);
        max_lat = max_lat.max(*lat);
        min_lon = min_lon.min(*lon);
        max_lon = max_lon.max(*lon);
    }
    let lat_pad = ((max_lat - min_lat) * 0.08).max(0.001);
    let lon_pad = ((max_lon - min_lon) * 0.08).max(0.001);
    Some((
        (min_lon - lon_pad)..(max_lon + lon_pad),
        (min_lat - lat_pad)..(max_lat + lat_pad),
    ))
}

/// Parse "#rrggbb", falling back to the palette by index.
fn segment_color(hex: Option<&str>, index: usize) -> RGBColor {
    if let Some(hex) = hex {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }
    PALETTE[index % PALETTE.len()]
}

fn scratch_path(kind: &str) -> PathBuf {
    let serial = RENDER_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "trek-map-{kind}-{}-{serial}.png",
        std::process::id()
    ))
}

fn read_and_remove(path: &PathBuf) -> Result<Vec<u8>, MapError> {
    let bytes = fs::read(path)?;
    let _ = fs::remove_file(path);
    Ok(bytes)
}

fn draw_err(err: impl std::fmt::Display) -> MapError {
    MapError::Draw(err.to_string())
}

/// Errors from map rendering.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("No geometry to draw")]
    NoGeometry,

    #[error("Failed to draw map: {0}")]
    Draw(String),

    #[error("Failed to read rendered image: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(name: &str, color: Option<&str>, points: Vec<(f64, f64)>) -> DetailSegment {
        DetailSegment {
            name: name.to_string(),
            color_hex: color.map(String::from),
            points,
        }
    }

    #[test]
    fn test_segment_color_parsing() {
        assert_eq!(segment_color(Some("#ff8800"), 0), RGBColor(255, 136, 0));
        assert_eq!(segment_color(Some("ff8800"), 0), RGBColor(255, 136, 0));
        // Malformed values fall back to the palette
        assert_eq!(segment_color(Some("#zzz"), 2), PALETTE[2]);
        assert_eq!(segment_color(None, 7), PALETTE[7 % PALETTE.len()]);
    }

    #[test]
    fn test_bounds_pads_degenerate_geometry() {
        let (x, y) = bounds(&[(59.0, 10.0)]).unwrap();
        assert!(x.start < 10.0 && x.end > 10.0);
        assert!(y.start < 59.0 && y.end > 59.0);
        assert!(bounds(&[]).is_none());
    }

    #[test]
    fn test_render_empty_geometry_fails_fast() {
        let renderer = MapRenderer::default();
        assert!(matches!(
            renderer.render_detail(&[]),
            Err(MapError::NoGeometry)
        ));
    }

    #[test]
    fn test_render_detail_smoke() {
        let renderer = MapRenderer::default();
        let segments = [
            segment(
                "Siri",
                Some("#1e90ff"),
                vec![(59.0, 10.0), (59.01, 10.01), (59.02, 10.01)],
            ),
            segment("Jonas", None, vec![(59.02, 10.01), (59.03, 10.02)]),
        ];
        let bytes = renderer.render_detail(&segments).expect("detail render");
        assert_eq!(&bytes[..8], &b"\x89PNG\r\n\x1a\n"[..]);
    }

    #[test]
    fn test_render_overview_smoke() {
        let renderer = MapRenderer::default();
        let traveled = vec![(59.0, 10.0), (59.05, 10.02), (59.1, 10.05)];
        let today = vec![(59.1, 10.05), (59.12, 10.06)];
        let bytes = renderer
            .render_overview(&traveled, &today, &[(59.05, 10.02)])
            .expect("overview render");
        assert_eq!(&bytes[..8], &b"\x89PNG\r\n\x1a\n"[..]);
    }
}
