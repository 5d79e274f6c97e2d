//! Default configuration file generation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::lighting::Channel;

/// Write a commented default `houselights.toml` to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration at {}", private_path(path));
    Ok(())
}

pub(crate) fn default_config_content() -> String {
    let mut builder = ConfigBuilder::new()
        .add_section("Behavior")
        .add_setting(
            "fade_duration",
            &format!("{DEFAULT_FADE_DURATION:.1}"),
            &format!("Fade time in seconds ({MINIMUM_FADE_DURATION}-{MAXIMUM_FADE_DURATION}, fractions allowed)"),
        )
        .add_setting(
            "dim_on_pause",
            &DEFAULT_DIM_ON_PAUSE.to_string(),
            "Dim to the paused levels when playback pauses",
        )
        .add_setting(
            "dim_on_screensaver",
            &DEFAULT_DIM_ON_SCREENSAVER.to_string(),
            "Dim to the screensaver levels when the screensaver starts",
        )
        .add_setting(
            "blackout_poll_interval",
            &DEFAULT_BLACKOUT_POLL_INTERVAL.to_string(),
            &format!(
                "How often the blackout window is checked ({MINIMUM_BLACKOUT_POLL_INTERVAL}-{MAXIMUM_BLACKOUT_POLL_INTERVAL}) seconds"
            ),
        )
        .add_setting(
            "player",
            &format!("\"{DEFAULT_PLAYER}\""),
            "MPRIS player to follow (e.g. \"vlc\"), \"auto\" picks the first one found",
        )
        .add_table("serial")
        .add_setting(
            "port",
            &format!("\"{DEFAULT_SERIAL_PORT}\""),
            "Serial device of the lighting controller",
        )
        .add_setting(
            "baud_rate",
            &DEFAULT_BAUD_RATE.to_string(),
            "Line speed, 8N1",
        )
        .add_section("Blackout window (uncomment to enable)")
        .add_comment("[blackout]")
        .add_comment("start = \"23:00:00\"")
        .add_comment("end = \"06:00:00\"");

    for channel in Channel::ALL {
        let defaults = crate::config::default_channel_config(channel);
        builder = builder
            .add_table(&format!("channels.{}", channel.key()))
            .add_setting(
                "enabled",
                &defaults.enabled.to_string(),
                "Disabled channels are never sent a command",
            )
            .add_setting(
                "address",
                &defaults.address.to_string(),
                "Channel number on the controller",
            )
            .add_setting(
                "normal",
                &defaults.brightness.normal.to_string(),
                "Brightness when nothing is playing (0-100)%",
            )
            .add_setting(
                "playing",
                &defaults.brightness.playing.to_string(),
                "Brightness during playback (0-100)%",
            )
            .add_setting(
                "paused",
                &defaults.brightness.paused.to_string(),
                "Brightness while paused (0-100)%",
            )
            .add_setting(
                "screensaver",
                &defaults.brightness.screensaver.to_string(),
                "Brightness while the screensaver runs (0-100)%",
            )
            .add_setting(
                "blackout",
                &defaults.blackout.to_string(),
                "Force off during the blackout window",
            );
    }

    let mut content = builder.build();
    content.push('\n');
    content
}

/// Assembles a TOML file with aligned trailing comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    /// `#[Title]` comment header.
    Section(String),
    /// Real TOML table header.
    Table(String),
    Comment(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(ConfigEntry::Table(format!("[{name}]")));
        self
    }

    fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(ConfigEntry::Comment(format!("# {text}")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(header) | ConfigEntry::Table(header) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(header);
                }
                ConfigEntry::Comment(line) => result.push(line),
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
