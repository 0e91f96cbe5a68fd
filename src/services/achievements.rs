// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record detection over the history of daily step totals.
//!
//! A fixed, ordered table of record categories is evaluated once per
//! processed day. The ordering matters twice: the daily announcement
//! surfaces only the first category with a new or tied record, and the
//! standings report lists the categories in the same order.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::DailySteps;

/// What kind of value a category tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CategoryKind {
    /// Highest `rank`-th best individual step count in a single day (1..=3)
    IndividualDaily { rank: usize },
    /// Highest group step total in a single day
    GroupDaily,
    /// Highest percentage share of a day's total steps by one person
    DailyShare,
    /// Largest day-over-day step increase for one person
    IndividualImprovement,
    /// Largest day-over-day step increase for the group total
    GroupImprovement,
    /// Longest run of consecutive days with the same sole daily winner
    FirstPlaceStreak,
}

/// A named superlative metric tracked over a journey's history.
#[derive(Debug, Clone)]
pub struct Category {
    pub kind: CategoryKind,
    /// Display description, e.g. "most steps in a single day"
    pub description: &'static str,
    /// Display unit appended to values
    pub unit: &'static str,
    pub emoji: &'static str,
    /// Journey-wide metric (no individual holders)
    pub collective: bool,
}

/// A record (new or tied) detected for a category on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEvent {
    pub kind: CategoryKind,
    /// Person ids achieving the value today; `None` for collective metrics
    pub holders: Option<Vec<i64>>,
    pub value: f64,
    /// Previous best holders, when an earlier best exists
    pub prev_holders: Option<Vec<i64>>,
    /// The beaten value. `None` marks a first occurrence or a tie rather
    /// than a beaten record.
    pub prev_value: Option<f64>,
}

/// One line of the standings report.
#[derive(Debug, Clone)]
pub struct Standing {
    pub description: &'static str,
    pub emoji: &'static str,
    pub holders: Option<Vec<i64>>,
    pub value: f64,
    pub unit: &'static str,
}

impl Standing {
    /// One formatted line for the standings report.
    pub fn display(&self, names: &HashMap<i64, String>) -> String {
        let value = format_value(self.value, self.unit);
        match &self.holders {
            Some(ids) if !ids.is_empty() => format!(
                "{} {}: {} ({})",
                self.emoji,
                self.description,
                value,
                join_names(ids, names)
            ),
            _ => format!("{} {}: {}", self.emoji, self.description, value),
        }
    }
}

/// The category's value achieved on one date.
#[derive(Debug, Clone)]
struct DailyValue {
    date: NaiveDate,
    holders: Option<Vec<i64>>,
    value: f64,
}

/// Evaluates the record category table against step history.
pub struct AchievementEngine {
    categories: Vec<Category>,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        // Priority order is fixed; the daily announcement picks the first
        // category that produces a record.
        Self {
            categories: vec![
                Category {
                    kind: CategoryKind::IndividualDaily { rank: 1 },
                    description: "most steps in a single day",
                    unit: "steps",
                    emoji: "🥇",
                    collective: false,
                },
                Category {
                    kind: CategoryKind::IndividualDaily { rank: 2 },
                    description: "second-most steps in a single day",
                    unit: "steps",
                    emoji: "🥈",
                    collective: false,
                },
                Category {
                    kind: CategoryKind::IndividualDaily { rank: 3 },
                    description: "third-most steps in a single day",
                    unit: "steps",
                    emoji: "🥉",
                    collective: false,
                },
                Category {
                    kind: CategoryKind::GroupDaily,
                    description: "most steps by the whole group in a day",
                    unit: "steps",
                    emoji: "🚀",
                    collective: true,
                },
                Category {
                    kind: CategoryKind::DailyShare,
                    description: "highest share of a day's steps",
                    unit: "%",
                    emoji: "🍰",
                    collective: false,
                },
                Category {
                    kind: CategoryKind::IndividualImprovement,
                    description: "biggest step-up from the day before",
                    unit: "steps",
                    emoji: "📈",
                    collective: false,
                },
                Category {
                    kind: CategoryKind::GroupImprovement,
                    description: "biggest group step-up from the day before",
                    unit: "steps",
                    emoji: "💥",
                    collective: true,
                },
                Category {
                    kind: CategoryKind::FirstPlaceStreak,
                    description: "longest streak of daily wins",
                    unit: "days",
                    emoji: "🔥",
                    collective: false,
                },
            ],
        }
    }
}

impl AchievementEngine {
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Detect whether `date` set a record for `category`.
    ///
    /// Returns `None` when the day produced no value for the category, or
    /// a value below the historical best. A value above the best strictly
    /// before `date` is a new record; an equal value is a tie; a value
    /// with no history at all is a first occurrence.
    pub fn extract(
        &self,
        category: &Category,
        history: &[DailySteps],
        date: NaiveDate,
    ) -> Option<RecordEvent> {
        let series = daily_values(category.kind, history, date);
        let today = series.iter().find(|v| v.date == date)?;

        let mut prev_best: Option<f64> = None;
        let mut prev_holders: Vec<i64> = Vec::new();
        for value in series.iter().filter(|v| v.date < date) {
            match prev_best {
                Some(best) if value.value < best => {}
                Some(best) if value.value == best => {
                    if let Some(holders) = &value.holders {
                        for id in holders {
                            if !prev_holders.contains(id) {
                                prev_holders.push(*id);
                            }
                        }
                    }
                }
                _ => {
                    prev_best = Some(value.value);
                    prev_holders = value.holders.clone().unwrap_or_default();
                }
            }
        }

        let event = |prev_value: Option<f64>, with_prev_holders: bool| RecordEvent {
            kind: category.kind,
            holders: today.holders.clone(),
            value: today.value,
            prev_holders: if with_prev_holders && !prev_holders.is_empty() {
                Some(prev_holders.clone())
            } else {
                None
            },
            prev_value,
        };

        match prev_best {
            None => Some(event(None, false)),
            Some(best) if today.value > best => Some(event(Some(best), true)),
            Some(best) if today.value == best => Some(event(None, true)),
            Some(_) => None,
        }
    }

    /// The day's single announcement: the first category (in priority
    /// order) with a new or tied record on `date`.
    pub fn daily_record(
        &self,
        history: &[DailySteps],
        date: NaiveDate,
    ) -> Option<(&Category, RecordEvent)> {
        self.categories
            .iter()
            .find_map(|category| Some((category, self.extract(category, history, date)?)))
    }

    /// Current best for every category as of `date`, for the standings
    /// report. Categories with no value yet are omitted.
    pub fn standings(&self, history: &[DailySteps], date: NaiveDate) -> Vec<Standing> {
        self.categories
            .iter()
            .filter_map(|category| {
                let series = daily_values(category.kind, history, date);
                let best = series
                    .iter()
                    .map(|v| v.value)
                    .fold(f64::NEG_INFINITY, f64::max);
                if !best.is_finite() {
                    return None;
                }
                let mut holders: Vec<i64> = Vec::new();
                for value in series.iter().filter(|v| v.value == best) {
                    if let Some(ids) = &value.holders {
                        for id in ids {
                            if !holders.contains(id) {
                                holders.push(*id);
                            }
                        }
                    }
                }
                Some(Standing {
                    description: category.description,
                    emoji: category.emoji,
                    holders: if category.collective { None } else { Some(holders) },
                    value: best,
                    unit: category.unit,
                })
            })
            .collect()
    }

    /// Human-readable announcement for a detected record.
    pub fn describe(
        &self,
        category: &Category,
        event: &RecordEvent,
        names: &HashMap<i64, String>,
    ) -> String {
        let value = format_value(event.value, category.unit);
        let who = match &event.holders {
            Some(ids) => join_names(ids, names),
            None => "The group".to_string(),
        };

        match (&event.prev_value, &event.prev_holders) {
            (Some(prev), prev_holders) => {
                let beaten = format_value(*prev, category.unit);
                match prev_holders {
                    Some(ids) => format!(
                        "{} New record! {} took {} with {}, beating the old {} held by {}!",
                        category.emoji,
                        who,
                        category.description,
                        value,
                        beaten,
                        join_names(ids, names),
                    ),
                    None => format!(
                        "{} New record! {} took {} with {}, up from {}!",
                        category.emoji, who, category.description, value, beaten,
                    ),
                }
            }
            (None, Some(prev_ids)) => format!(
                "{} {} matched the record for {}: {}, shared with {}.",
                category.emoji,
                who,
                category.description,
                value,
                join_names(prev_ids, names),
            ),
            (None, None) => format!(
                "{} First entry in the books: {} opened {} at {}!",
                category.emoji, who, category.description, value,
            ),
        }
    }
}

/// Per-date values for one category kind, for all dates up to `as_of`.
fn daily_values(kind: CategoryKind, history: &[DailySteps], as_of: NaiveDate) -> Vec<DailyValue> {
    // Group contributions by date; a zero amount counts as absent.
    let mut by_date: HashMap<NaiveDate, Vec<&DailySteps>> = HashMap::new();
    for row in history.iter().filter(|r| r.date <= as_of && r.amount > 0) {
        by_date.entry(row.date).or_default().push(row);
    }
    let mut dates: Vec<NaiveDate> = by_date.keys().copied().collect();
    dates.sort();

    match kind {
        CategoryKind::IndividualDaily { rank } => dates
            .iter()
            .filter_map(|date| {
                let mut rows = by_date[date].clone();
                rows.sort_by(|a, b| b.amount.cmp(&a.amount));
                let at_rank = rows.get(rank - 1)?;
                let holders = rows
                    .iter()
                    .filter(|r| r.amount == at_rank.amount)
                    .map(|r| r.person_id)
                    .collect();
                Some(DailyValue {
                    date: *date,
                    holders: Some(holders),
                    value: f64::from(at_rank.amount),
                })
            })
            .collect(),

        CategoryKind::GroupDaily => dates
            .iter()
            .map(|date| DailyValue {
                date: *date,
                holders: None,
                value: by_date[date].iter().map(|r| f64::from(r.amount)).sum(),
            })
            .collect(),

        CategoryKind::DailyShare => dates
            .iter()
            .filter_map(|date| {
                let rows = &by_date[date];
                let total: f64 = rows.iter().map(|r| f64::from(r.amount)).sum();
                let best = rows.iter().map(|r| r.amount).max()?;
                let holders = rows
                    .iter()
                    .filter(|r| r.amount == best)
                    .map(|r| r.person_id)
                    .collect();
                Some(DailyValue {
                    date: *date,
                    holders: Some(holders),
                    value: f64::from(best) / total * 100.0,
                })
            })
            .collect(),

        CategoryKind::IndividualImprovement => dates
            .iter()
            .filter_map(|date| {
                let yesterday = date.checked_sub_days(Days::new(1))?;
                let previous = by_date.get(&yesterday)?;
                let mut best: Option<(i64, i64)> = None; // (delta, person)
                for row in &by_date[date] {
                    let Some(prev_row) = previous.iter().find(|r| r.person_id == row.person_id)
                    else {
                        continue;
                    };
                    let delta = i64::from(row.amount) - i64::from(prev_row.amount);
                    if delta > 0 && best.map_or(true, |(b, _)| delta > b) {
                        best = Some((delta, row.person_id));
                    }
                }
                let (delta, _) = best?;
                let holders = by_date[date]
                    .iter()
                    .filter(|row| {
                        previous
                            .iter()
                            .find(|r| r.person_id == row.person_id)
                            .is_some_and(|prev_row| {
                                i64::from(row.amount) - i64::from(prev_row.amount) == delta
                            })
                    })
                    .map(|r| r.person_id)
                    .collect();
                Some(DailyValue {
                    date: *date,
                    holders: Some(holders),
                    value: delta as f64,
                })
            })
            .collect(),

        CategoryKind::GroupImprovement => dates
            .iter()
            .filter_map(|date| {
                let yesterday = date.checked_sub_days(Days::new(1))?;
                let previous = by_date.get(&yesterday)?;
                let today_total: i64 = by_date[date].iter().map(|r| i64::from(r.amount)).sum();
                let prev_total: i64 = previous.iter().map(|r| i64::from(r.amount)).sum();
                let delta = today_total - prev_total;
                (delta > 0).then(|| DailyValue {
                    date: *date,
                    holders: None,
                    value: delta as f64,
                })
            })
            .collect(),

        CategoryKind::FirstPlaceStreak => {
            // Sole daily winners only; a tie for first place has no winner
            // and breaks any running streak.
            let mut values = Vec::new();
            let mut streak: u32 = 0;
            let mut streak_holder: Option<i64> = None;
            let mut prev_date: Option<NaiveDate> = None;
            for date in &dates {
                let rows = &by_date[date];
                let best = rows.iter().map(|r| r.amount).max().unwrap_or(0);
                let mut winners = rows.iter().filter(|r| r.amount == best);
                let winner = winners.next().map(|r| r.person_id);
                let sole = winner.filter(|_| winners.next().is_none());

                let consecutive = prev_date
                    .and_then(|p| p.checked_add_days(Days::new(1)))
                    .is_some_and(|expected| expected == *date);
                match sole {
                    Some(person) if consecutive && streak_holder == Some(person) => streak += 1,
                    Some(person) => {
                        streak = 1;
                        streak_holder = Some(person);
                    }
                    None => {
                        streak = 0;
                        streak_holder = None;
                    }
                }
                prev_date = Some(*date);

                if let Some(person) = streak_holder.filter(|_| streak > 0) {
                    values.push(DailyValue {
                        date: *date,
                        holders: Some(vec![person]),
                        value: f64::from(streak),
                    });
                }
            }
            values
        }
    }
}

/// Format a record value with its unit.
fn format_value(value: f64, unit: &str) -> String {
    if unit == "%" {
        format!("{value:.1}%")
    } else {
        format!("{value:.0} {unit}")
    }
}

/// "Siri", "Siri and Jonas", "Siri, Jonas and Nils".
fn join_names(ids: &[i64], names: &HashMap<i64, String>) -> String {
    let resolved: Vec<String> = ids
        .iter()
        .map(|id| {
            names
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("#{id}"))
        })
        .collect();
    match resolved.as_slice() {
        [] => "nobody".to_string(),
        [only] => only.clone(),
        [first, last] => format!("{first} and {last}"),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
