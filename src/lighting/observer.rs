//! Host-facing event types and the observer traits the engine implements.
//!
//! The host (a media player integration, a screensaver monitor) only needs to call these
//! methods; how the events reach the process is up to the `io` layer.

use std::sync::Arc;

use chrono::NaiveTime;

use super::encoder::TransitionCommand;
use super::mode::PlayerObservation;
use crate::config::Config;

/// Playback notifications from the media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Started,
    Ended,
    Stopped,
    Paused,
    Resumed,
}

/// Desktop notifications that affect lighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    ScreensaverActivated,
    ScreensaverDeactivated,
}

/// Receiver for playback notifications. Every handler returns the commands to send.
pub trait PlayerObserver {
    fn on_started(&mut self) -> Vec<TransitionCommand>;
    fn on_ended(&mut self) -> Vec<TransitionCommand>;
    fn on_stopped(&mut self) -> Vec<TransitionCommand>;
    fn on_paused(&mut self) -> Vec<TransitionCommand>;
    fn on_resumed(&mut self) -> Vec<TransitionCommand>;

    fn on_player_event(&mut self, event: PlayerEvent) -> Vec<TransitionCommand> {
        match event {
            PlayerEvent::Started => self.on_started(),
            PlayerEvent::Ended => self.on_ended(),
            PlayerEvent::Stopped => self.on_stopped(),
            PlayerEvent::Paused => self.on_paused(),
            PlayerEvent::Resumed => self.on_resumed(),
        }
    }
}

/// Receiver for screensaver and settings notifications.
pub trait SystemObserver {
    fn on_screensaver_activated(&mut self) -> Vec<TransitionCommand>;
    fn on_screensaver_deactivated(&mut self) -> Vec<TransitionCommand>;

    /// A new configuration snapshot replaces the old one wholesale. `live` is sampled
    /// from the player at the time of the change.
    fn on_settings_changed(
        &mut self,
        config: Arc<Config>,
        live: PlayerObservation,
        now: NaiveTime,
    ) -> Vec<TransitionCommand>;

    fn on_system_event(&mut self, event: SystemEvent) -> Vec<TransitionCommand> {
        match event {
            SystemEvent::ScreensaverActivated => self.on_screensaver_activated(),
            SystemEvent::ScreensaverDeactivated => self.on_screensaver_deactivated(),
        }
    }
}
