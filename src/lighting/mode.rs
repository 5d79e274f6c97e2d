//! Lighting modes and how they are derived from player observations.

use std::fmt;

use crate::config::Config;

/// The lighting scenario currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    Playing,
    Paused,
    Screensaver,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => write!(f, "Normal"),
            Mode::Playing => write!(f, "Playing"),
            Mode::Paused => write!(f, "Paused"),
            Mode::Screensaver => write!(f, "Screensaver"),
        }
    }
}

/// A snapshot of what the host reports about playback and the screensaver.
///
/// The flags come from independent sources and may contradict each other
/// (paused while not playing, for instance); `resolve_mode` handles every combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerObservation {
    pub screensaver_active: bool,
    pub paused: bool,
    /// Also true while seeking, buffering, forwarding or rewinding.
    pub playing: bool,
}

impl PlayerObservation {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn playing() -> Self {
        Self {
            playing: true,
            ..Self::default()
        }
    }

    pub fn paused() -> Self {
        Self {
            paused: true,
            playing: true,
            ..Self::default()
        }
    }

    pub fn with_screensaver(mut self, active: bool) -> Self {
        self.screensaver_active = active;
        self
    }
}

/// Pick the canonical mode: Screensaver > Paused > Playing > Normal.
pub fn resolve_mode(observed: PlayerObservation) -> Mode {
    if observed.screensaver_active {
        Mode::Screensaver
    } else if observed.paused {
        Mode::Paused
    } else if observed.playing {
        Mode::Playing
    } else {
        Mode::Normal
    }
}

/// Resolve the mode the engine should be in, honouring the dim toggles.
///
/// With `dim_on_screensaver` off the screensaver is ignored; with `dim_on_pause` off a
/// paused player counts as playing. These are the modes the event handlers would have
/// reached had they seen every event.
pub fn resolve_effective_mode(observed: PlayerObservation, config: &Config) -> Mode {
    let observed = PlayerObservation {
        screensaver_active: observed.screensaver_active && config.dim_on_screensaver,
        ..observed
    };

    match resolve_mode(observed) {
        Mode::Paused if !config.dim_on_pause => Mode::Playing,
        mode => mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use proptest::prelude::*;

    #[test]
    fn screensaver_wins_over_everything() {
        let observed = PlayerObservation {
            screensaver_active: true,
            paused: true,
            playing: true,
        };
        assert_eq!(resolve_mode(observed), Mode::Screensaver);
    }

    #[test]
    fn paused_wins_over_playing() {
        assert_eq!(resolve_mode(PlayerObservation::paused()), Mode::Paused);
    }

    #[test]
    fn paused_without_playback_is_still_paused() {
        let observed = PlayerObservation {
            paused: true,
            ..PlayerObservation::idle()
        };
        assert_eq!(resolve_mode(observed), Mode::Paused);
    }

    #[test]
    fn idle_is_normal() {
        assert_eq!(resolve_mode(PlayerObservation::idle()), Mode::Normal);
        assert_eq!(resolve_mode(PlayerObservation::playing()), Mode::Playing);
    }

    #[test]
    fn effective_mode_ignores_screensaver_when_not_dimming() {
        let mut config = Config::default();
        config.dim_on_screensaver = false;
        let observed = PlayerObservation::playing().with_screensaver(true);
        assert_eq!(resolve_effective_mode(observed, &config), Mode::Playing);
    }

    #[test]
    fn effective_mode_treats_pause_as_playing_when_not_dimming() {
        let mut config = Config::default();
        config.dim_on_pause = false;
        assert_eq!(
            resolve_effective_mode(PlayerObservation::paused(), &config),
            Mode::Playing
        );
    }

    proptest! {
        #[test]
        fn precedence_is_total(screensaver: bool, paused: bool, playing: bool) {
            let observed = PlayerObservation { screensaver_active: screensaver, paused, playing };
            let expected = if screensaver {
                Mode::Screensaver
            } else if paused {
                Mode::Paused
            } else if playing {
                Mode::Playing
            } else {
                Mode::Normal
            };
            prop_assert_eq!(resolve_mode(observed), expected);
        }
    }
}
