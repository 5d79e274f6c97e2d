//! Configuration system for houselights.
//!
//! Settings live in `houselights.toml` under `$XDG_CONFIG_HOME/houselights/`, or in the
//! directory given with `--config`. A commented default file is written on first start.
//!
//! ```toml
//! fade_duration = 3.0          # Fade time in seconds (0-600, fractions allowed)
//! dim_on_pause = true          # Dim to the paused levels when playback pauses
//! dim_on_screensaver = true    # Dim to the screensaver levels when the screensaver starts
//! blackout_poll_interval = 1   # How often the blackout window is checked (1-300) seconds
//! player = "auto"              # MPRIS player to follow, "auto" picks the first one found
//!
//! [serial]
//! port = "/dev/ttyACM0"
//! baud_rate = 9600
//!
//! [blackout]
//! start = "23:00:00"
//! end = "06:00:00"
//!
//! [channels.house]
//! enabled = true
//! address = 1
//! normal = 100
//! playing = 0
//! paused = 40
//! screensaver = 20
//! blackout = false
//! ```
//!
//! ## Loading pipeline
//!
//! The file is parsed into `ConfigFile`, where every field is optional. `validation`
//! rejects values that cannot be interpreted (bad times, an empty port, clashing
//! addresses). `loading` then fills in defaults and clamps numeric settings that are
//! merely out of range, logging a warning for each. The result is the immutable `Config`
//! the engine works from, shared as `Arc<Config>` and replaced wholesale on reload.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::constants::*;
use crate::common::utils::{format_seconds, private_path};
use crate::lighting::{BlackoutWindow, BrightnessLevels, Channel, ChannelConfig};

pub use builder::create_default_config;
pub use loading::{
    get_config_path, get_custom_config_dir, load, load_from_path, parse_config, set_config_dir,
};
pub use watcher::start_config_watcher;

/// Serial link settings. Changing either field reopens the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Fully resolved configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub serial: SerialSettings,
    /// Fade time in seconds.
    pub fade_duration: f64,
    pub dim_on_pause: bool,
    pub dim_on_screensaver: bool,
    /// Seconds between blackout checks.
    pub blackout_poll_interval: u64,
    /// MPRIS bus name suffix, or `"auto"`.
    pub player: String,
    pub blackout: Option<BlackoutWindow>,
    /// Indexed by `Channel::index`.
    pub channels: [ChannelConfig; Channel::COUNT],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            fade_duration: DEFAULT_FADE_DURATION,
            dim_on_pause: DEFAULT_DIM_ON_PAUSE,
            dim_on_screensaver: DEFAULT_DIM_ON_SCREENSAVER,
            blackout_poll_interval: DEFAULT_BLACKOUT_POLL_INTERVAL,
            player: DEFAULT_PLAYER.to_string(),
            blackout: None,
            channels: Channel::ALL.map(default_channel_config),
        }
    }
}

/// Defaults for a channel table that is missing or incomplete.
pub(crate) fn default_channel_config(channel: Channel) -> ChannelConfig {
    let (enabled, address) = match channel {
        Channel::House => (true, DEFAULT_HOUSE_ADDRESS),
        Channel::Aisle => (true, DEFAULT_AISLE_ADDRESS),
        Channel::Ambient => (false, DEFAULT_AMBIENT_ADDRESS),
    };
    ChannelConfig {
        enabled,
        address,
        brightness: BrightnessLevels {
            normal: DEFAULT_NORMAL_BRIGHTNESS as u8,
            playing: DEFAULT_PLAYING_BRIGHTNESS as u8,
            paused: DEFAULT_PAUSED_BRIGHTNESS as u8,
            screensaver: DEFAULT_SCREENSAVER_BRIGHTNESS as u8,
        },
        blackout: false,
    }
}

impl Config {
    pub fn channel(&self, channel: Channel) -> &ChannelConfig {
        &self.channels[channel.index()]
    }

    /// Fade time in whole milliseconds, as sent to the controller.
    pub fn fade_duration_ms(&self) -> u64 {
        (self.fade_duration * 1000.0).round() as u64
    }

    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    pub fn log_config(&self, path: Option<&Path>) {
        match path {
            Some(path) => log_block_start!("Loaded configuration from {}", private_path(path)),
            None => log_block_start!("Loaded configuration"),
        }

        log_indented!(
            "Serial: {} @ {} baud",
            self.serial.port,
            self.serial.baud_rate
        );
        log_indented!("Fade duration: {}", format_seconds(self.fade_duration));
        log_indented!(
            "Dim on pause: {}, dim on screensaver: {}",
            self.dim_on_pause,
            self.dim_on_screensaver
        );
        log_indented!("Player: {}", self.player);

        match &self.blackout {
            Some(window) => log_indented!(
                "Blackout: {} - {} (checked every {})",
                window.start.format("%H:%M:%S"),
                window.end.format("%H:%M:%S"),
                format_seconds(self.blackout_poll_interval as f64)
            ),
            None => log_indented!("Blackout: none"),
        }

        for channel in Channel::ALL {
            let settings = self.channel(channel);
            if !settings.enabled {
                log_indented!("{}: disabled", channel);
                continue;
            }
            let levels = settings.brightness;
            log_indented!(
                "{} (address {}): normal {}%, playing {}%, paused {}%, screensaver {}%{}",
                channel,
                settings.address,
                levels.normal,
                levels.playing,
                levels.paused,
                levels.screensaver,
                if settings.blackout { ", blackout" } else { "" }
            );
        }
    }
}

/// On-disk layout of `houselights.toml`. Everything is optional.
///
/// Numeric settings that get clamped are read as signed integers (brightness as any
/// TOML value) so that out-of-range values produce a warning instead of a parse error.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub(crate) struct ConfigFile {
    pub(crate) fade_duration: Option<f64>,
    pub(crate) dim_on_pause: Option<bool>,
    pub(crate) dim_on_screensaver: Option<bool>,
    pub(crate) blackout_poll_interval: Option<i64>,
    pub(crate) player: Option<String>,
    pub(crate) serial: Option<SerialSection>,
    pub(crate) blackout: Option<BlackoutSection>,
    pub(crate) channels: Option<ChannelsSection>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub(crate) struct SerialSection {
    pub(crate) port: Option<String>,
    pub(crate) baud_rate: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub(crate) struct BlackoutSection {
    pub(crate) start: Option<String>,
    pub(crate) end: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub(crate) struct ChannelsSection {
    pub(crate) house: Option<ChannelSection>,
    pub(crate) aisle: Option<ChannelSection>,
    pub(crate) ambient: Option<ChannelSection>,
}

impl ChannelsSection {
    pub(crate) fn get(&self, channel: Channel) -> Option<&ChannelSection> {
        match channel {
            Channel::House => self.house.as_ref(),
            Channel::Aisle => self.aisle.as_ref(),
            Channel::Ambient => self.ambient.as_ref(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub(crate) struct ChannelSection {
    pub(crate) enabled: Option<bool>,
    pub(crate) address: Option<u16>,
    // Read loosely so floats and quoted numbers are clamped rather than rejected
    pub(crate) normal: Option<toml::Value>,
    pub(crate) playing: Option<toml::Value>,
    pub(crate) paused: Option<toml::Value>,
    pub(crate) screensaver: Option<toml::Value>,
    pub(crate) blackout: Option<bool>,
}

#[cfg(test)]
mod tests;
