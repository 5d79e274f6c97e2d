//! Configuration loading functionality.
//!
//! Resolves the config path, parses the TOML, runs validation and turns the optional
//! on-disk fields into a complete `Config`, clamping out-of-range values on the way.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::validation::{validate_channel_addresses, validate_config};
use super::{Config, ConfigFile, SerialSettings, default_channel_config};
use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::lighting::{BlackoutWindow, BrightnessLevels, Channel, ChannelConfig};

pub const CONFIG_FILE_NAME: &str = "houselights.toml";

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
///
/// Can only be called once, typically from `main`.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// The directory passed with `--config`, if any.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("houselights").join(CONFIG_FILE_NAME))
}

/// Load the configuration from the resolved path, writing a default file first if
/// none exists yet.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path without creating anything.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    parse_config(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))
}

/// Parse, validate and resolve configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let file: ConfigFile = toml::from_str(content).context("Invalid TOML")?;

    validate_config(&file)?;
    let config = apply_defaults_and_modifications(file)?;
    validate_channel_addresses(&config)?;

    Ok(config)
}

/// Fill in defaults and clamp out-of-range values.
///
/// Only modifies values; anything that cannot be interpreted at all is rejected
/// earlier by `validation::validate_config`.
pub(crate) fn apply_defaults_and_modifications(file: ConfigFile) -> Result<Config> {
    let defaults = Config::default();

    let serial = file.serial.unwrap_or_default();
    let serial = SerialSettings {
        port: serial.port.unwrap_or(defaults.serial.port),
        baud_rate: serial.baud_rate.unwrap_or(defaults.serial.baud_rate),
    };

    let fade_duration = clamp_fade_duration(file.fade_duration.unwrap_or(DEFAULT_FADE_DURATION));

    let blackout_poll_interval = clamp_poll_interval(
        file.blackout_poll_interval
            .unwrap_or(DEFAULT_BLACKOUT_POLL_INTERVAL as i64),
    );

    let blackout = match file.blackout {
        Some(section) => match (section.start, section.end) {
            (Some(start), Some(end)) => Some(BlackoutWindow::parse(&start, &end)?),
            _ => None,
        },
        None => None,
    };

    let channels_section = file.channels.unwrap_or_default();
    let channels = Channel::ALL.map(|channel| {
        let defaults = default_channel_config(channel);
        let Some(section) = channels_section.get(channel) else {
            return defaults;
        };

        let level = |value: Option<&toml::Value>, fallback: u8, mode: &str| match value {
            Some(value) => read_brightness(value, fallback, channel, mode),
            None => fallback,
        };

        ChannelConfig {
            enabled: section.enabled.unwrap_or(defaults.enabled),
            address: section.address.unwrap_or(defaults.address),
            brightness: BrightnessLevels {
                normal: level(section.normal.as_ref(), defaults.brightness.normal, "normal"),
                playing: level(section.playing.as_ref(), defaults.brightness.playing, "playing"),
                paused: level(section.paused.as_ref(), defaults.brightness.paused, "paused"),
                screensaver: level(
                    section.screensaver.as_ref(),
                    defaults.brightness.screensaver,
                    "screensaver",
                ),
            },
            blackout: section.blackout.unwrap_or(defaults.blackout),
        }
    });

    Ok(Config {
        serial,
        fade_duration,
        dim_on_pause: file.dim_on_pause.unwrap_or(DEFAULT_DIM_ON_PAUSE),
        dim_on_screensaver: file.dim_on_screensaver.unwrap_or(DEFAULT_DIM_ON_SCREENSAVER),
        blackout_poll_interval,
        player: file.player.unwrap_or(defaults.player),
        blackout,
        channels,
    })
}

/// Accept integers, floats (rounded) and numeric strings. Anything else falls back to
/// the default with a warning.
fn read_brightness(value: &toml::Value, fallback: u8, channel: Channel, mode: &str) -> u8 {
    let number = match value {
        toml::Value::Integer(value) => Some(*value),
        toml::Value::Float(value) => rounded(*value),
        toml::Value::String(text) => text.trim().parse::<f64>().ok().and_then(rounded),
        _ => None,
    };

    match number {
        Some(number) => clamp_brightness(number, channel, mode),
        None => {
            log_pipe!();
            log_warning!(
                "channels.{}.{} ({}) is not a number, using {}%",
                channel.key(),
                mode,
                value,
                fallback
            );
            fallback
        }
    }
}

fn rounded(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.round() as i64)
}

fn clamp_brightness(value: i64, channel: Channel, mode: &str) -> u8 {
    let clamped = value.clamp(MINIMUM_BRIGHTNESS, MAXIMUM_BRIGHTNESS);
    if clamped != value {
        log_pipe!();
        log_warning!(
            "channels.{}.{} ({}) is out of range, using {}%",
            channel.key(),
            mode,
            value,
            clamped
        );
    }
    clamped as u8
}

fn clamp_fade_duration(value: f64) -> f64 {
    if !value.is_finite() {
        log_pipe!();
        log_warning!(
            "fade_duration ({}) is not a number, using {}",
            value,
            DEFAULT_FADE_DURATION
        );
        return DEFAULT_FADE_DURATION;
    }

    let clamped = value.clamp(MINIMUM_FADE_DURATION, MAXIMUM_FADE_DURATION);
    if clamped != value {
        log_pipe!();
        log_warning!(
            "fade_duration ({}) must be between {} and {} seconds, using {}",
            value,
            MINIMUM_FADE_DURATION,
            MAXIMUM_FADE_DURATION,
            clamped
        );
    }
    clamped
}

fn clamp_poll_interval(value: i64) -> u64 {
    let clamped = value.clamp(
        MINIMUM_BLACKOUT_POLL_INTERVAL as i64,
        MAXIMUM_BLACKOUT_POLL_INTERVAL as i64,
    );
    if clamped != value {
        log_pipe!();
        log_warning!(
            "blackout_poll_interval ({}) must be between {} and {} seconds, using {}",
            value,
            MINIMUM_BLACKOUT_POLL_INTERVAL,
            MAXIMUM_BLACKOUT_POLL_INTERVAL,
            clamped
        );
    }
    clamped as u64
}
