//! Scheduled blackout windows.
//!
//! A blackout window is a daily time-of-day interval during which opted-in channels are
//! forced to zero whatever the current mode. Whether a window is active is a pure
//! function of the clock, so the engine polls it rather than waiting for an event.

use anyhow::{Context, Result};
use chrono::NaiveTime;

use super::channel::ChannelConfig;

/// Daily interval `[start, end)`. When `start > end` the window spans midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackoutWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BlackoutWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse a window from two `HH:MM[:SS]` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_time_of_day(start).context("Invalid blackout start time")?,
            end: parse_time_of_day(end).context("Invalid blackout end time")?,
        })
    }

    pub fn is_active(&self, now: NaiveTime) -> bool {
        is_time_in_range(now, self.start, self.end)
    }

    /// Whether the window wraps past midnight.
    pub fn spans_midnight(&self) -> bool {
        self.start > self.end
    }
}

/// Check whether `time` lies in `[start, end)`, wrapping at midnight.
///
/// An empty range (`start == end`) never matches.
pub fn is_time_in_range(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    use std::cmp::Ordering;

    match start.cmp(&end) {
        Ordering::Less => time >= start && time < end,
        Ordering::Greater => time >= start || time < end,
        Ordering::Equal => false,
    }
}

/// Whether `channel` must be held at zero right now.
pub fn is_channel_blacked_out(
    window: Option<&BlackoutWindow>,
    channel: &ChannelConfig,
    now: NaiveTime,
) -> bool {
    channel.blackout && window.is_some_and(|window| window.is_active(now))
}

/// Accepts `HH:MM:SS` or `HH:MM`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .with_context(|| format!("'{value}' is not a time of day (use HH:MM:SS)"))
}
