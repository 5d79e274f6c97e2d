//! Wire encoding for the lighting controller.
//!
//! The controller accepts one ASCII command per line:
//!
//! ```text
//! set {channel},{level}
//! exponential {channel},{start},{end},{duration_ms}
//! logarithmic {channel},{start},{end},{duration_ms}
//! alloff
//! ```
//!
//! Levels on the wire are 0-255. Everything above the wire uses percentages.

use std::fmt;

use super::channel::Channel;
use crate::common::constants::MAX_WIRE_LEVEL;

/// Convert a brightness percentage to the controller's 0-255 scale.
///
/// Computes `round(2.55 * percent)` with halves rounded up, in integer arithmetic so
/// that values like 30% land on 77 rather than depending on float representation.
pub fn to_wire_level(percent: u8) -> u8 {
    debug_assert!(percent <= 100, "brightness percent out of range: {percent}");
    let percent = u32::from(percent.min(100));
    let level = (percent * u32::from(MAX_WIRE_LEVEL) + 50) / 100;
    level.min(u32::from(MAX_WIRE_LEVEL)) as u8
}

/// Fade curve selected by the controller firmware.
///
/// Rising fades use `exponential`, falling and flat fades use `logarithmic`. The
/// firmware depends on this split, including the flat case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeMethod {
    Exponential,
    Logarithmic,
}

impl FadeMethod {
    /// Pick the method for a fade between two wire levels.
    pub fn for_levels(wire_start: u8, wire_end: u8) -> Self {
        if wire_end > wire_start {
            FadeMethod::Exponential
        } else {
            FadeMethod::Logarithmic
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FadeMethod::Exponential => "exponential",
            FadeMethod::Logarithmic => "logarithmic",
        }
    }
}

pub fn encode_set(address: u16, percent: u8) -> String {
    format!("set {address},{}", to_wire_level(percent))
}

pub fn encode_fade(address: u16, start_percent: u8, end_percent: u8, duration_ms: u64) -> String {
    let start = to_wire_level(start_percent);
    let end = to_wire_level(end_percent);
    let method = FadeMethod::for_levels(start, end);
    format!("{} {address},{start},{end},{duration_ms}", method.as_str())
}

pub fn encode_all_off() -> &'static str {
    "alloff"
}

/// A single instruction for the controller, produced by the transition engine.
///
/// Levels are percentages; conversion happens in `encode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionCommand {
    /// Jump straight to a level.
    Set {
        channel: Channel,
        address: u16,
        level: u8,
    },
    /// Let the controller fade between two levels.
    Fade {
        channel: Channel,
        address: u16,
        start: u8,
        end: u8,
        duration_ms: u64,
    },
    /// Every channel to zero, immediately.
    AllOff,
}

impl TransitionCommand {
    /// The channel this command targets, `None` for `AllOff`.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            TransitionCommand::Set { channel, .. } | TransitionCommand::Fade { channel, .. } => {
                Some(*channel)
            }
            TransitionCommand::AllOff => None,
        }
    }

    /// Wire form without the trailing newline.
    pub fn encode(&self) -> String {
        match *self {
            TransitionCommand::Set { address, level, .. } => encode_set(address, level),
            TransitionCommand::Fade {
                address,
                start,
                end,
                duration_ms,
                ..
            } => encode_fade(address, start, end, duration_ms),
            TransitionCommand::AllOff => encode_all_off().to_string(),
        }
    }
}

impl fmt::Display for TransitionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wire_level_rounds_half_up() {
        assert_eq!(to_wire_level(0), 0);
        assert_eq!(to_wire_level(30), 77); // 76.5
        assert_eq!(to_wire_level(50), 128); // 127.5
        assert_eq!(to_wire_level(80), 204);
        assert_eq!(to_wire_level(100), 255);
    }

    #[test]
    fn set_command_format() {
        assert_eq!(encode_set(1, 100), "set 1,255");
        assert_eq!(encode_set(12, 0), "set 12,0");
    }

    #[test]
    fn fade_direction_picks_method() {
        assert_eq!(encode_fade(1, 30, 80, 3000), "exponential 1,77,204,3000");
        assert_eq!(encode_fade(2, 80, 30, 1500), "logarithmic 2,204,77,1500");
    }

    #[test]
    fn flat_fade_is_logarithmic() {
        assert_eq!(encode_fade(3, 40, 40, 500), "logarithmic 3,102,102,500");
    }

    #[test]
    fn command_display_matches_encoding() {
        let fade = TransitionCommand::Fade {
            channel: Channel::House,
            address: 1,
            start: 30,
            end: 80,
            duration_ms: 3000,
        };
        assert_eq!(fade.to_string(), "exponential 1,77,204,3000");
        assert_eq!(fade.channel(), Some(Channel::House));
        assert_eq!(TransitionCommand::AllOff.to_string(), "alloff");
        assert_eq!(TransitionCommand::AllOff.channel(), None);
    }

    proptest! {
        #[test]
        fn wire_level_matches_scaled_percent(percent in 0u8..=100) {
            // 2.55 * p, computed as 255p / 100 so exact halves stay exact
            let expected = (255.0 * f64::from(percent) / 100.0 + 0.5).floor();
            let level = to_wire_level(percent);
            prop_assert_eq!(f64::from(level), expected);
        }

        #[test]
        fn fade_method_follows_direction(start in 0u8..=100, end in 0u8..=100) {
            let line = encode_fade(1, start, end, 1000);
            if to_wire_level(end) > to_wire_level(start) {
                prop_assert!(line.starts_with("exponential "));
            } else {
                prop_assert!(line.starts_with("logarithmic "));
            }
        }
    }
}
