//! The lighting state machine.
//!
//! `TransitionEngine` owns the current mode and per-channel blackout state. Each event
//! handler compares the old and new targets for every channel and returns the commands
//! needed to get there, in `Channel::ALL` order. The engine never performs I/O and never
//! fails; events that do not apply in the current mode return no commands.

use std::sync::Arc;

use chrono::NaiveTime;

use super::blackout::is_channel_blacked_out;
use super::brightness::target_percent;
use super::channel::Channel;
use super::encoder::TransitionCommand;
use super::mode::{Mode, PlayerObservation, resolve_effective_mode};
use super::observer::{PlayerObserver, SystemObserver};
use crate::config::Config;

pub struct TransitionEngine {
    config: Arc<Config>,
    mode: Mode,
    blacked_out: [bool; Channel::COUNT],
    debug_enabled: bool,
}

impl TransitionEngine {
    /// Create an engine whose mode and blackout state are derived from what the host
    /// currently reports. Nothing is emitted; call `reinitialize` once the port is open.
    pub fn new(
        config: Arc<Config>,
        live: PlayerObservation,
        now: NaiveTime,
        debug_enabled: bool,
    ) -> Self {
        let mode = resolve_effective_mode(live, &config);
        let blacked_out = blackout_states(&config, now);
        Self {
            config,
            mode,
            blacked_out,
            debug_enabled,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn is_blacked_out(&self, channel: Channel) -> bool {
        self.blacked_out[channel.index()]
    }

    /// Swap the configuration without emitting anything.
    ///
    /// Used when the serial settings changed and the port is about to be reopened; the
    /// following `reinitialize` brings the lights back.
    pub fn replace_config(&mut self, config: Arc<Config>) {
        self.config = config;
    }

    /// Level a channel should be at right now, blackout included.
    pub fn effective_target(&self, channel: Channel) -> u8 {
        if self.is_blacked_out(channel) {
            0
        } else {
            target_percent(self.mode, channel, &self.config)
        }
    }

    /// Re-derive state after the port (re)opened and fade every enabled channel up from
    /// zero to where it should be.
    pub fn reinitialize(&mut self, live: PlayerObservation, now: NaiveTime) -> Vec<TransitionCommand> {
        self.set_mode(resolve_effective_mode(live, &self.config));
        self.blacked_out = blackout_states(&self.config, now);

        let duration_ms = self.config.fade_duration_ms();
        let mut commands = Vec::new();
        for channel in Channel::ALL {
            let settings = self.config.channel(channel);
            if !settings.enabled {
                continue;
            }
            let target = self.effective_target(channel);
            if target == 0 {
                continue;
            }
            commands.push(TransitionCommand::Fade {
                channel,
                address: settings.address,
                start: 0,
                end: target,
                duration_ms,
            });
        }
        commands
    }

    /// Re-evaluate the blackout window and fade any channel that crossed an edge.
    ///
    /// Called on every poll tick. Blackout state is tracked for disabled channels as
    /// well so that enabling one later does not produce a spurious edge.
    pub fn check_blackout(&mut self, now: NaiveTime) -> Vec<TransitionCommand> {
        let duration_ms = self.config.fade_duration_ms();
        let mut commands = Vec::new();

        for channel in Channel::ALL {
            let settings = self.config.channel(channel);
            let active = is_channel_blacked_out(self.config.blackout.as_ref(), settings, now);
            if active == self.blacked_out[channel.index()] {
                continue;
            }
            self.blacked_out[channel.index()] = active;

            if active {
                log_block_start!("Blackout started for {} lights", channel);
            } else {
                log_block_start!("Blackout ended for {} lights", channel);
            }

            if !settings.enabled {
                continue;
            }

            let target = target_percent(self.mode, channel, &self.config);
            let (start, end) = if active { (target, 0) } else { (0, target) };
            if start == end {
                continue;
            }
            commands.push(TransitionCommand::Fade {
                channel,
                address: settings.address,
                start,
                end,
                duration_ms,
            });
        }

        commands
    }

    /// Turn everything off.
    pub fn shutdown(&self) -> Vec<TransitionCommand> {
        vec![TransitionCommand::AllOff]
    }

    /// Move to `to`, fading every enabled, non-blacked-out channel from the old mode's
    /// target to the new one.
    fn transition_to(&mut self, to: Mode) -> Vec<TransitionCommand> {
        let from = self.mode;
        let duration_ms = self.config.fade_duration_ms();
        let mut commands = Vec::new();

        for channel in Channel::ALL {
            let settings = self.config.channel(channel);
            if !settings.enabled || self.is_blacked_out(channel) {
                continue;
            }
            let start = target_percent(from, channel, &self.config);
            let end = target_percent(to, channel, &self.config);
            if start == end {
                continue;
            }
            commands.push(TransitionCommand::Fade {
                channel,
                address: settings.address,
                start,
                end,
                duration_ms,
            });
        }

        self.set_mode(to);
        commands
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log_block_start!("Lighting mode: {} → {}", self.mode, mode);
            self.mode = mode;
        }
    }

    fn ignored(&self, event: &str) -> Vec<TransitionCommand> {
        if self.debug_enabled {
            log_debug!("Ignoring {} in {} mode", event, self.mode);
        }
        Vec::new()
    }
}

impl PlayerObserver for TransitionEngine {
    fn on_started(&mut self) -> Vec<TransitionCommand> {
        match self.mode {
            Mode::Normal => self.transition_to(Mode::Playing),
            Mode::Paused => self.on_resumed(),
            _ => self.ignored("playback start"),
        }
    }

    fn on_ended(&mut self) -> Vec<TransitionCommand> {
        match self.mode {
            Mode::Playing | Mode::Paused => self.transition_to(Mode::Normal),
            _ => self.ignored("playback end"),
        }
    }

    fn on_stopped(&mut self) -> Vec<TransitionCommand> {
        match self.mode {
            Mode::Playing | Mode::Paused => self.transition_to(Mode::Normal),
            _ => self.ignored("playback stop"),
        }
    }

    fn on_paused(&mut self) -> Vec<TransitionCommand> {
        if self.config.dim_on_pause && self.mode == Mode::Playing {
            self.transition_to(Mode::Paused)
        } else {
            self.ignored("pause")
        }
    }

    fn on_resumed(&mut self) -> Vec<TransitionCommand> {
        if self.config.dim_on_pause && self.mode == Mode::Paused {
            self.transition_to(Mode::Playing)
        } else {
            self.ignored("resume")
        }
    }
}

impl SystemObserver for TransitionEngine {
    fn on_screensaver_activated(&mut self) -> Vec<TransitionCommand> {
        if self.config.dim_on_screensaver && self.mode != Mode::Screensaver {
            self.transition_to(Mode::Screensaver)
        } else {
            self.ignored("screensaver activation")
        }
    }

    // Always returns to Normal, even if a player is still playing underneath.
    fn on_screensaver_deactivated(&mut self) -> Vec<TransitionCommand> {
        if self.config.dim_on_screensaver && self.mode == Mode::Screensaver {
            self.transition_to(Mode::Normal)
        } else {
            self.ignored("screensaver deactivation")
        }
    }

    fn on_settings_changed(
        &mut self,
        config: Arc<Config>,
        live: PlayerObservation,
        now: NaiveTime,
    ) -> Vec<TransitionCommand> {
        self.config = config;
        self.set_mode(resolve_effective_mode(live, &self.config));
        self.blacked_out = blackout_states(&self.config, now);

        Channel::ALL
            .into_iter()
            .filter(|channel| self.config.channel(*channel).enabled)
            .map(|channel| TransitionCommand::Set {
                channel,
                address: self.config.channel(channel).address,
                level: self.effective_target(channel),
            })
            .collect()
    }
}

fn blackout_states(config: &Config, now: NaiveTime) -> [bool; Channel::COUNT] {
    Channel::ALL.map(|channel| {
        is_channel_blacked_out(config.blackout.as_ref(), config.channel(channel), now)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::test_constants::*;
    use crate::lighting::blackout::BlackoutWindow;
    use crate::lighting::brightness::BrightnessLevels;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn noon() -> NaiveTime {
        at(12, 0)
    }

    /// House only: normal 30, playing 80, paused 50, screensaver 10.
    fn house_only_config() -> Config {
        let mut config = Config::default();
        config.fade_duration = TEST_FADE_DURATION;
        for channel in Channel::ALL {
            config.channels[channel.index()].enabled = channel == Channel::House;
        }
        config.channels[Channel::House.index()].brightness = BrightnessLevels {
            normal: TEST_HOUSE_NORMAL as u8,
            playing: TEST_HOUSE_PLAYING as u8,
            paused: 50,
            screensaver: 10,
        };
        config
    }

    fn engine_with(config: Config, live: PlayerObservation) -> TransitionEngine {
        TransitionEngine::new(Arc::new(config), live, noon(), false)
    }

    fn fade(channel: Channel, address: u16, start: u8, end: u8) -> TransitionCommand {
        TransitionCommand::Fade {
            channel,
            address,
            start,
            end,
            duration_ms: 3000,
        }
    }

    #[test]
    fn new_derives_mode_from_live_state() {
        let engine = engine_with(house_only_config(), PlayerObservation::paused());
        assert_eq!(engine.mode(), Mode::Paused);

        let engine = engine_with(house_only_config(), PlayerObservation::idle());
        assert_eq!(engine.mode(), Mode::Normal);
    }

    #[test]
    fn started_from_normal_fades_up() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::idle());
        let commands = engine.on_started();

        assert_eq!(commands, vec![fade(Channel::House, 1, 30, 80)]);
        assert_eq!(commands[0].encode(), "exponential 1,77,204,3000");
        assert_eq!(engine.mode(), Mode::Playing);
    }

    #[test]
    fn started_while_paused_resumes() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::paused());
        let commands = engine.on_started();
        assert_eq!(commands, vec![fade(Channel::House, 1, 50, 80)]);
        assert_eq!(engine.mode(), Mode::Playing);
    }

    #[test]
    fn ended_from_paused_starts_at_paused_target() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::paused());
        let commands = engine.on_ended();
        assert_eq!(commands, vec![fade(Channel::House, 1, 50, 30)]);
        assert_eq!(engine.mode(), Mode::Normal);
    }

    #[test]
    fn repeated_pause_is_a_no_op() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::playing());
        assert_eq!(engine.on_paused().len(), 1);
        assert!(engine.on_paused().is_empty());
        assert_eq!(engine.mode(), Mode::Paused);
    }

    #[test]
    fn unmatched_events_change_nothing() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::idle());
        assert!(engine.on_stopped().is_empty());
        assert!(engine.on_ended().is_empty());
        assert!(engine.on_resumed().is_empty());
        assert!(engine.on_paused().is_empty());
        assert!(engine.on_screensaver_deactivated().is_empty());
        assert_eq!(engine.mode(), Mode::Normal);
    }

    #[test]
    fn pause_ignored_when_not_dimming_on_pause() {
        let mut config = house_only_config();
        config.dim_on_pause = false;
        let mut engine = engine_with(config, PlayerObservation::playing());

        assert!(engine.on_paused().is_empty());
        assert_eq!(engine.mode(), Mode::Playing);
    }

    #[test]
    fn screensaver_deactivation_always_returns_to_normal() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::playing());

        assert_eq!(
            engine.on_screensaver_activated(),
            vec![fade(Channel::House, 1, 80, 10)]
        );
        assert_eq!(engine.mode(), Mode::Screensaver);

        assert_eq!(
            engine.on_screensaver_deactivated(),
            vec![fade(Channel::House, 1, 10, 30)]
        );
        assert_eq!(engine.mode(), Mode::Normal);
    }

    #[test]
    fn screensaver_ignored_when_not_dimming() {
        let mut config = house_only_config();
        config.dim_on_screensaver = false;
        let mut engine = engine_with(config, PlayerObservation::idle());

        assert!(engine.on_screensaver_activated().is_empty());
        assert_eq!(engine.mode(), Mode::Normal);
    }

    #[test]
    fn equal_levels_emit_nothing_but_mode_changes() {
        let mut config = house_only_config();
        config.channels[Channel::House.index()].brightness.playing = TEST_HOUSE_NORMAL as u8;
        let mut engine = engine_with(config, PlayerObservation::idle());

        assert!(engine.on_started().is_empty());
        assert_eq!(engine.mode(), Mode::Playing);
    }

    #[test]
    fn disabled_channels_are_never_addressed() {
        let mut config = house_only_config();
        config.channels[Channel::Ambient.index()].enabled = true;
        config.channels[Channel::Ambient.index()].address = 9;
        let mut engine = engine_with(config, PlayerObservation::idle());

        let commands = engine.on_started();
        let channels: Vec<_> = commands.iter().filter_map(|c| c.channel()).collect();
        assert_eq!(channels, vec![Channel::House, Channel::Ambient]);
    }

    #[test]
    fn blackout_edges_fade_out_and_back() {
        let mut config = house_only_config();
        config.blackout = Some(BlackoutWindow::parse(TEST_BLACKOUT_START, TEST_BLACKOUT_END).unwrap());
        config.channels[Channel::House.index()].blackout = true;
        let mut engine = TransitionEngine::new(
            Arc::new(config),
            PlayerObservation::playing(),
            at(21, 0),
            false,
        );

        assert!(engine.check_blackout(at(21, 30)).is_empty());
        assert_eq!(
            engine.check_blackout(at(22, 0)),
            vec![fade(Channel::House, 1, 80, 0)]
        );
        assert!(engine.is_blacked_out(Channel::House));
        assert!(engine.check_blackout(at(23, 0)).is_empty());

        // Mode changes during blackout do not touch the channel
        assert!(engine.on_ended().is_empty());
        assert_eq!(engine.mode(), Mode::Normal);

        assert_eq!(
            engine.check_blackout(at(2, 0)),
            vec![fade(Channel::House, 1, 0, 30)]
        );
    }

    #[test]
    fn settings_change_sets_levels_from_live_state() {
        let mut engine = engine_with(house_only_config(), PlayerObservation::idle());

        let mut updated = house_only_config();
        updated.channels[Channel::House.index()].brightness.playing = 60;
        let commands =
            engine.on_settings_changed(Arc::new(updated), PlayerObservation::playing(), noon());

        assert_eq!(engine.mode(), Mode::Playing);
        assert_eq!(
            commands,
            vec![TransitionCommand::Set {
                channel: Channel::House,
                address: 1,
                level: 60,
            }]
        );
    }

    #[test]
    fn reinitialize_fades_up_from_zero_and_skips_dark_channels() {
        let mut config = house_only_config();
        config.channels[Channel::Aisle.index()].enabled = true;
        config.channels[Channel::Aisle.index()].brightness.normal = 0;
        let mut engine = engine_with(config, PlayerObservation::idle());

        let commands = engine.reinitialize(PlayerObservation::idle(), noon());
        assert_eq!(commands, vec![fade(Channel::House, 1, 0, 30)]);
    }

    #[test]
    fn shutdown_turns_everything_off() {
        let engine = engine_with(house_only_config(), PlayerObservation::playing());
        assert_eq!(engine.shutdown(), vec![TransitionCommand::AllOff]);
    }
}
