//! Period statistics over a loaded session list.
//!
//! Everything here is a pure function of the sessions and a reference "now",
//! so callers recompute on demand from a [`crate::store::SessionLog`]
//! snapshot. Windows are open-ended: they include every session at or after
//! their start.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Period {
    #[strum(serialize = "This week")]
    Week,
    #[strum(serialize = "This month")]
    Month,
    #[strum(serialize = "This year")]
    Year,
}

impl Period {
    /// Inclusive lower bound of the period containing `now`: Monday 00:00 of
    /// the ISO week, the 1st of the month, or January 1st.
    pub fn start(self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let first_day = match self {
            Period::Week => {
                today - Duration::days(today.weekday().num_days_from_monday() as i64)
            }
            Period::Month => today.with_day(1).unwrap_or(today),
            Period::Year => today.with_ordinal(1).unwrap_or(today),
        };
        first_day.and_time(NaiveTime::MIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeriodAggregate {
    pub total_seconds: u64,
    pub average_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overall {
    pub count: usize,
    pub total_seconds: u64,
    pub average_minutes: f64,
}

/// One bar of a per-day chart
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub label: String,
    pub minutes: f64,
}

/// One bar of a per-month chart
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBar {
    pub month: u32,
    pub label: String,
    pub minutes: f64,
}

pub fn count_in_window(sessions: &[Session], start: NaiveDateTime) -> usize {
    sessions.iter().filter(|s| s.timestamp >= start).count()
}

pub fn aggregate_in_window(sessions: &[Session], start: NaiveDateTime) -> PeriodAggregate {
    let (count, total_seconds) = sessions
        .iter()
        .filter(|s| s.timestamp >= start)
        .fold((0usize, 0u64), |(n, total), s| {
            (n + 1, total.saturating_add(s.duration))
        });

    PeriodAggregate {
        total_seconds,
        average_minutes: average_minutes(total_seconds, count),
    }
}

pub fn period_count(sessions: &[Session], period: Period, now: NaiveDateTime) -> usize {
    count_in_window(sessions, period.start(now))
}

pub fn period_aggregate(sessions: &[Session], period: Period, now: NaiveDateTime) -> PeriodAggregate {
    aggregate_in_window(sessions, period.start(now))
}

/// Minutes per day for every day in `from..=to`, zero-filled, in date order.
pub fn group_by_day(sessions: &[Session], from: NaiveDate, to: NaiveDate) -> Vec<DailyBar> {
    let totals = sessions
        .iter()
        .filter(|s| (from..=to).contains(&s.timestamp.date()))
        .into_grouping_map_by(|s| s.timestamp.date())
        .fold(0u64, |acc, _, s| acc.saturating_add(s.duration));

    from.iter_days()
        .take_while(|d| *d <= to)
        .map(|date| DailyBar {
            date,
            label: date.format("%a").to_string(),
            minutes: to_minutes(totals.get(&date).copied().unwrap_or(0)),
        })
        .collect()
}

/// Minutes per month of `year`. Months without any time are left out.
pub fn group_by_month(sessions: &[Session], year: i32) -> Vec<MonthlyBar> {
    sessions
        .iter()
        .filter(|s| s.timestamp.year() == year)
        .into_grouping_map_by(|s| s.timestamp.month())
        .fold(0u64, |acc, _, s| acc.saturating_add(s.duration))
        .into_iter()
        .filter(|(_, total)| *total > 0)
        .sorted_by_key(|(month, _)| *month)
        .map(|(month, total)| MonthlyBar {
            month,
            label: month_label(month),
            minutes: to_minutes(total),
        })
        .collect()
}

/// Minutes per day since the start of the current month, skipping empty days.
pub fn month_daily(sessions: &[Session], now: NaiveDateTime) -> Vec<DailyBar> {
    let first = Period::Month.start(now).date();
    sessions
        .iter()
        .filter(|s| s.timestamp.date() >= first)
        .into_grouping_map_by(|s| s.timestamp.date())
        .fold(0u64, |acc, _, s| acc.saturating_add(s.duration))
        .into_iter()
        .filter(|(_, total)| *total > 0)
        .sorted_by_key(|(date, _)| *date)
        .map(|(date, total)| DailyBar {
            date,
            label: date.format("%d").to_string(),
            minutes: to_minutes(total),
        })
        .collect()
}

pub fn most_recent(sessions: &[Session]) -> Option<&Session> {
    sessions.iter().max_by_key(|s| s.timestamp)
}

pub fn count_on_day(sessions: &[Session], day: NaiveDate) -> usize {
    sessions
        .iter()
        .filter(|s| s.timestamp.date() == day)
        .count()
}

pub fn overall(sessions: &[Session]) -> Overall {
    let total_seconds = sessions
        .iter()
        .map(|s| s.duration)
        .fold(0u64, u64::saturating_add);
    Overall {
        count: sessions.len(),
        total_seconds,
        average_minutes: average_minutes(total_seconds, sessions.len()),
    }
}

/// What the "latest session" card shows
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSummary {
    pub timestamp: NaiveDateTime,
    pub duration: u64,
    pub days_ago: i64,
}

impl LatestSummary {
    pub fn streak_note(&self) -> String {
        match self.days_ago {
            0 => "checked in today".to_string(),
            1 => "checked in yesterday".to_string(),
            n => format!("skipped {n} days"),
        }
    }

    pub fn display_date(&self) -> String {
        match self.days_ago {
            0 => "Today".to_string(),
            1 => "Yesterday".to_string(),
            _ => self.timestamp.format("%b %-d").to_string(),
        }
    }
}

pub fn latest_summary(sessions: &[Session], today: NaiveDate) -> Option<LatestSummary> {
    most_recent(sessions).map(|s| LatestSummary {
        timestamp: s.timestamp,
        duration: s.duration,
        days_ago: today.signed_duration_since(s.timestamp.date()).num_days(),
    })
}

/// Encouragement tiers by lifetime session count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Nothing,
    FirstSteps,
    Habit,
    Regular,
    Lifestyle,
    Legend,
}

impl Milestone {
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => Milestone::Nothing,
            1..=2 => Milestone::FirstSteps,
            3..=9 => Milestone::Habit,
            10..=29 => Milestone::Regular,
            30..=99 => Milestone::Lifestyle,
            _ => Milestone::Legend,
        }
    }

    pub fn messages(self) -> &'static [&'static str] {
        match self {
            Milestone::Nothing => &["Nothing recorded yet"],
            Milestone::FirstSteps => &[
                "Not a beginner anymore, you're on your way",
                "The first time doesn't matter, keep going",
                "That was no accident, it's a start",
            ],
            Milestone::Habit => &[
                "Not an accident, a habit",
                "That's a steady output already",
            ],
            Milestone::Regular => &[
                "The numbers speak for themselves",
                "This is no passing whim",
                "You really are doing this",
            ],
            Milestone::Lifestyle => &[
                "It's part of life now",
                "No reminders needed, you just show up",
                "Hard to call this a log anymore",
            ],
            Milestone::Legend => &[
                "Not a habit, a part of you",
                "Nothing left to prove",
                "The data is just the trail you leave behind",
            ],
        }
    }

    pub fn message<R: Rng + ?Sized>(self, rng: &mut R) -> &'static str {
        self.messages().choose(rng).copied().unwrap_or_default()
    }
}

fn average_minutes(total_seconds: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_seconds as f64 / 60.0 / count as f64
    }
}

fn to_minutes(seconds: u64) -> f64 {
    seconds as f64 / 60.0
}

fn month_label(month: u32) -> String {
    NaiveDate::from_ymd_opt(2000, month, 1)
        .map(|d| d.format("%b").to_string())
        .unwrap_or_default()
}
