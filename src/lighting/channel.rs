//! Lighting channels (zones) and their configured settings.

use std::fmt;

use super::brightness::BrightnessLevels;

/// An independently controllable lighting zone.
///
/// Commands are always emitted in `Channel::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    House,
    Aisle,
    Ambient,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::House, Channel::Aisle, Channel::Ambient];
    pub const COUNT: usize = Self::ALL.len();

    /// Position in `ALL`, used to index per-channel state arrays.
    pub fn index(self) -> usize {
        match self {
            Channel::House => 0,
            Channel::Aisle => 1,
            Channel::Ambient => 2,
        }
    }

    /// Key used for this channel in the config file (`[channels.<key>]`).
    pub fn key(self) -> &'static str {
        match self {
            Channel::House => "house",
            Channel::Aisle => "aisle",
            Channel::Ambient => "ambient",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::House => write!(f, "House"),
            Channel::Aisle => write!(f, "Aisle"),
            Channel::Ambient => write!(f, "Ambient"),
        }
    }
}

/// Settings for one channel after defaults and clamping have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Disabled channels are never sent a command.
    pub enabled: bool,
    /// Controller-side channel number used on the wire.
    pub address: u16,
    pub brightness: BrightnessLevels,
    /// Whether the blackout window applies to this channel.
    pub blackout: bool,
}
