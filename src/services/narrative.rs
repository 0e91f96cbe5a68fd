// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Message composition.
//!
//! Pure formatting: every function here turns already-resolved data into
//! an ordered list of chat blocks plus a plain-text fallback. No I/O and
//! no randomness, so composed output is fully deterministic.

use chrono::NaiveDate;
use serde_json::{json, Value};

/// A composed chat message: rich blocks plus a plain-text fallback used
/// for notifications and clients without block support.
#[derive(Debug, Clone)]
pub struct Narrative {
    pub blocks: Vec<Value>,
    pub fallback: String,
}

/// Everything the daily report needs, resolved by the caller.
#[derive(Debug, Clone, Default)]
pub struct DailyReport {
    pub day_number: i64,
    pub origin: String,
    pub destination: String,
    /// (first name, step amount), any order; the composer sorts
    pub steps: Vec<(String, u32)>,
    pub distance_today_meters: f64,
    pub distance_total_meters: f64,
    pub route_distance_meters: f64,
    pub achievement: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub new_country: bool,
    pub poi: Option<String>,
    pub overview_image_url: Option<String>,
    pub detail_image_url: Option<String>,
}

/// Compose the daily progress report.
pub fn daily_report(report: &DailyReport) -> Narrative {
    let mut blocks = Vec::new();

    let headline = format!(
        "*Day {}* of the trek from {} to {}: the group covered {} today!",
        report.day_number,
        report.origin,
        report.destination,
        format_km(report.distance_today_meters),
    );
    blocks.push(section(&headline));

    blocks.push(section(&step_breakdown(&report.steps)));

    let remaining = (report.route_distance_meters - report.distance_total_meters).max(0.0);
    blocks.push(context(&format!(
        "{} traveled so far, {} to go.",
        format_km(report.distance_total_meters),
        format_km(remaining),
    )));

    if let Some(achievement) = &report.achievement {
        blocks.push(section(achievement));
    }

    if let Some(address) = &report.address {
        blocks.push(context(&format!("Tonight's camp: {address}")));
    }
    if report.new_country {
        if let Some(country) = &report.country {
            blocks.push(section(&format!(
                "🗺️ We crossed the border: welcome to {country}!"
            )));
        }
    }
    if let Some(poi) = &report.poi {
        blocks.push(context(&format!("Nearby: {poi}")));
    }

    if let Some(url) = &report.overview_image_url {
        blocks.push(image(url, "Route overview"));
    }
    if let Some(url) = &report.detail_image_url {
        blocks.push(image(url, "Today's stretch"));
    }

    let fallback = format!(
        "Day {}: {} today, {} total.",
        report.day_number,
        format_km(report.distance_today_meters),
        format_km(report.distance_total_meters),
    );

    Narrative { blocks, fallback }
}

/// Compose the celebration posted once when the destination is reached.
pub fn finish_report(
    origin: &str,
    destination: &str,
    day_number: i64,
    route_distance_meters: f64,
) -> Narrative {
    let text = format!(
        "🎉 *We made it!* {origin} to {destination}, {} in {day_number} days. \
         Every single step counted.",
        format_km(route_distance_meters),
    );
    Narrative {
        blocks: vec![section(&text)],
        fallback: format!("{origin} to {destination}: finished in {day_number} days!"),
    }
}

/// Compose the on-demand status answer for the slash command.
pub fn status_report(
    origin: &str,
    destination: &str,
    date: Option<NaiveDate>,
    distance_total_meters: f64,
    route_distance_meters: f64,
    address: Option<&str>,
) -> Narrative {
    let percent = if route_distance_meters > 0.0 {
        distance_total_meters / route_distance_meters * 100.0
    } else {
        0.0
    };
    let mut text = format!(
        "On the way from {origin} to {destination}: {} of {} ({percent:.0}%).",
        format_km(distance_total_meters),
        format_km(route_distance_meters),
    );
    if let Some(address) = address {
        text.push_str(&format!(" Currently near {address}."));
    }
    if let Some(date) = date {
        text.push_str(&format!(" Last update: {date}."));
    }
    Narrative {
        blocks: vec![section(&text)],
        fallback: text,
    }
}

/// Compose the all-time standings answer, one line per record category.
pub fn standings_report(lines: &[String]) -> Narrative {
    if lines.is_empty() {
        let text = "No records on the books yet. Get walking!".to_string();
        return Narrative {
            blocks: vec![section(&text)],
            fallback: text,
        };
    }
    let body = lines.join("\n");
    Narrative {
        blocks: vec![section("*All-time records*"), section(&body)],
        fallback: format!("All-time records:\n{body}"),
    }
}

/// Compose the on-demand body-metrics summary.
pub fn weight_report(entries: &[(String, Option<f64>)]) -> Narrative {
    let mut lines = Vec::new();
    for (name, weight) in entries {
        match weight {
            Some(kg) => lines.push(format!("• {name}: {kg:.1} kg")),
            None => lines.push(format!("• {name}: no data")),
        }
    }
    let body = lines.join("\n");
    Narrative {
        blocks: vec![section("*Weigh-in*"), section(&body)],
        fallback: format!("Weigh-in:\n{body}"),
    }
}

/// Per-person step lines, sorted descending, with a medal for the day's
/// top walker and a turtle for the last one.
fn step_breakdown(steps: &[(String, u32)]) -> String {
    let mut sorted: Vec<&(String, u32)> = steps.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let last_index = sorted.len().saturating_sub(1);
    sorted
        .iter()
        .enumerate()
        .map(|(i, (name, amount))| {
            let badge = if i == 0 {
                "🥇 "
            } else if i == last_index && sorted.len() > 1 {
                "🐢 "
            } else {
                ""
            };
            format!(
                "• {badge}{name}: {amount} steps ({})",
                format_km(f64::from(*amount) * crate::models::STRIDE_METERS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_km(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

fn section(text: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn context(text: &str) -> Value {
    json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": text }]
    })
}

fn image(url: &str, alt: &str) -> Value {
    json!({
        "type": "image",
        "image_url": url,
        "alt_text": alt
    })
}
