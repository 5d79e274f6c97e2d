//! Per-mode brightness targets.

use super::channel::Channel;
use super::mode::Mode;
use crate::config::Config;

/// Configured brightness percentages for one channel, one per mode.
///
/// Values are clamped to 0-100 when the config is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessLevels {
    pub normal: u8,
    pub playing: u8,
    pub paused: u8,
    pub screensaver: u8,
}

impl BrightnessLevels {
    pub fn for_mode(&self, mode: Mode) -> u8 {
        match mode {
            Mode::Normal => self.normal,
            Mode::Playing => self.playing,
            Mode::Paused => self.paused,
            Mode::Screensaver => self.screensaver,
        }
    }
}

/// Configured target for `channel` in `mode`, ignoring blackout.
pub fn target_percent(mode: Mode, channel: Channel, config: &Config) -> u8 {
    config.channel(channel).brightness.for_mode(mode).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_uses_the_channel_and_mode() {
        let mut config = Config::default();
        config.channels[Channel::Aisle.index()].brightness = BrightnessLevels {
            normal: 70,
            playing: 5,
            paused: 35,
            screensaver: 15,
        };

        assert_eq!(target_percent(Mode::Normal, Channel::Aisle, &config), 70);
        assert_eq!(target_percent(Mode::Playing, Channel::Aisle, &config), 5);
        assert_eq!(target_percent(Mode::Paused, Channel::Aisle, &config), 35);
        assert_eq!(target_percent(Mode::Screensaver, Channel::Aisle, &config), 15);
    }
}
