//! Media player and screensaver monitoring over the session D-Bus.
//!
//! Two monitor threads feed the main loop:
//! - the player monitor follows an MPRIS player's `PlaybackStatus` and sends
//!   `SignalMessage::Player` events when it changes
//! - the screensaver monitor listens for `org.freedesktop.ScreenSaver.ActiveChanged`
//!   and sends `SignalMessage::System` events
//!
//! `DbusPlayerProbe` answers the "what is going on right now" question used at startup,
//! on reload and after the port reconnects.
//!
//! If the session bus is unavailable both monitors log a warning and exit; the daemon
//! keeps running with blackout scheduling only.

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;
use zbus::blocking::Connection;

use crate::io::signals::SignalMessage;
use crate::lighting::{PlayerEvent, PlayerObservation, SystemEvent};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// How often the player monitor samples `PlaybackStatus`. Players come and go, so the
/// monitor polls rather than holding a property stream on one bus name.
const PLAYER_POLL_INTERVAL_MS: u64 = 500;

/// Delay before the screensaver monitor tries again after losing its subscription.
const RESTART_DELAY_MS: u64 = 2000;
const MAX_THREAD_RESTARTS: u8 = 3;

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer {
    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;
}

#[zbus::proxy(
    interface = "org.freedesktop.ScreenSaver",
    default_service = "org.freedesktop.ScreenSaver",
    default_path = "/org/freedesktop/ScreenSaver"
)]
trait ScreenSaver {
    fn get_active(&self) -> zbus::Result<bool>;

    #[zbus(signal)]
    fn active_changed(&self, active: bool) -> zbus::Result<()>;
}

/// The `player` setting, shared with the monitor thread so a reload can retarget it.
pub type PlayerSelector = Arc<RwLock<String>>;

/// MPRIS `PlaybackStatus` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    /// Unknown values are treated as stopped.
    pub fn parse(value: &str) -> Self {
        match value {
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            _ => PlaybackStatus::Stopped,
        }
    }
}

/// Map a status change to the event the engine should see.
///
/// MPRIS has no separate "ended" state, so the end of a file is reported as stopped.
pub fn playback_event(previous: PlaybackStatus, current: PlaybackStatus) -> Option<PlayerEvent> {
    use PlaybackStatus::*;

    match (previous, current) {
        (Paused, Playing) => Some(PlayerEvent::Resumed),
        (Stopped, Playing) => Some(PlayerEvent::Started),
        (Playing, Paused) => Some(PlayerEvent::Paused),
        (Playing | Paused, Stopped) => Some(PlayerEvent::Stopped),
        // Player showed up already paused
        (Stopped, Paused) => Some(PlayerEvent::Paused),
        _ => None,
    }
}

/// Samples the player and screensaver state on demand.
pub trait PlayerProbe {
    fn observe(&self) -> PlayerObservation;
}

/// Probe backed by the session bus. Without a bus it reports idle.
pub struct DbusPlayerProbe {
    connection: Option<Connection>,
    player: PlayerSelector,
}

impl DbusPlayerProbe {
    pub fn new(player: PlayerSelector, debug_enabled: bool) -> Self {
        let connection = match Connection::session() {
            Ok(connection) => Some(connection),
            Err(e) => {
                if debug_enabled {
                    log_pipe!();
                    log_debug!("Session D-Bus unavailable for state queries: {}", e);
                }
                None
            }
        };
        Self { connection, player }
    }
}

impl PlayerProbe for DbusPlayerProbe {
    fn observe(&self) -> PlayerObservation {
        let Some(connection) = &self.connection else {
            return PlayerObservation::idle();
        };

        let selector = current_selector(&self.player);
        let status = query_playback_status(connection, &selector)
            .ok()
            .flatten()
            .unwrap_or(PlaybackStatus::Stopped);

        let screensaver_active = ScreenSaverProxyBlocking::new(connection)
            .and_then(|proxy| proxy.get_active())
            .unwrap_or(false);

        PlayerObservation {
            screensaver_active,
            paused: status == PlaybackStatus::Paused,
            playing: status != PlaybackStatus::Stopped,
        }
    }
}

/// Probe returning whatever it was last told. Useful without a desktop session.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Clone, Default)]
pub struct FixedPlayerProbe {
    observation: Arc<RwLock<PlayerObservation>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl FixedPlayerProbe {
    pub fn new(observation: PlayerObservation) -> Self {
        Self {
            observation: Arc::new(RwLock::new(observation)),
        }
    }

    pub fn set(&self, observation: PlayerObservation) {
        if let Ok(mut current) = self.observation.write() {
            *current = observation;
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl PlayerProbe for FixedPlayerProbe {
    fn observe(&self) -> PlayerObservation {
        self.observation
            .read()
            .map(|observation| *observation)
            .unwrap_or_default()
    }
}

fn current_selector(player: &PlayerSelector) -> String {
    player
        .read()
        .map(|selector| selector.clone())
        .unwrap_or_else(|_| crate::common::constants::DEFAULT_PLAYER.to_string())
}

/// Whether an MPRIS bus name belongs to the configured player.
///
/// `"auto"` matches any player. A specific name matches the exact bus name and
/// per-instance names such as `org.mpris.MediaPlayer2.vlc.instance1234`.
pub fn matches_player(bus_name: &str, selector: &str) -> bool {
    let Some(suffix) = bus_name.strip_prefix(MPRIS_PREFIX) else {
        return false;
    };
    if selector == "auto" {
        return true;
    }
    suffix == selector
        || suffix
            .strip_prefix(selector)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Bus names of every running player the selector matches.
fn find_players(connection: &Connection, selector: &str) -> Result<Vec<String>> {
    let dbus = zbus::blocking::fdo::DBusProxy::new(connection)
        .context("Failed to create D-Bus proxy")?;
    let mut names: Vec<String> = dbus
        .list_names()
        .context("Failed to list bus names")?
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| matches_player(name, selector))
        .collect();
    names.sort();
    Ok(names)
}

fn player_status(connection: &Connection, bus_name: &str) -> Result<PlaybackStatus> {
    let proxy = MediaPlayerProxyBlocking::builder(connection)
        .destination(bus_name.to_string())?
        .cache_properties(zbus::proxy::CacheProperties::No)
        .build()
        .context("Failed to create MPRIS proxy")?;

    let status = proxy
        .playback_status()
        .with_context(|| format!("Failed to read PlaybackStatus of {bus_name}"))?;
    Ok(PlaybackStatus::parse(&status))
}

/// The most active of several players' states: Playing, then Paused, then Stopped.
pub fn pick_status(statuses: &[PlaybackStatus]) -> PlaybackStatus {
    use PlaybackStatus::*;

    if statuses.contains(&Playing) {
        Playing
    } else if statuses.contains(&Paused) {
        Paused
    } else {
        Stopped
    }
}

/// Combined status of all matching players. `None` when no matching player is running.
///
/// A failed query only counts when no other player is playing, so one flaky player
/// cannot make an active one look stopped.
fn query_playback_status(connection: &Connection, selector: &str) -> Result<Option<PlaybackStatus>> {
    let names = find_players(connection, selector)?;
    if names.is_empty() {
        return Ok(None);
    }

    let mut statuses = Vec::with_capacity(names.len());
    let mut failure = None;
    for name in &names {
        match player_status(connection, name) {
            Ok(status) => statuses.push(status),
            Err(e) => failure = Some(e),
        }
    }

    match failure {
        Some(e) if !statuses.contains(&PlaybackStatus::Playing) => Err(e),
        _ => Ok(Some(pick_status(&statuses))),
    }
}

/// Start the player and screensaver monitors.
pub fn start_host_monitors(
    signal_sender: Sender<SignalMessage>,
    player: PlayerSelector,
    debug_enabled: bool,
) {
    let connection = match Connection::session() {
        Ok(connection) => connection,
        Err(e) => {
            log_pipe!();
            log_warning!("Session D-Bus unavailable: {}", e);
            log_indented!("Playback and screensaver changes will not be followed");
            log_indented!("Blackout scheduling continues to work");
            return;
        }
    };

    thread::spawn({
        let connection = connection.clone();
        let signal_sender = signal_sender.clone();
        move || monitor_player(connection, signal_sender, player, debug_enabled)
    });

    thread::spawn(move || {
        let mut restarts = 0;
        loop {
            match monitor_screensaver(&connection, &signal_sender, debug_enabled) {
                Ok(()) => break,
                Err(e) => {
                    log_pipe!();
                    log_warning!("Screensaver monitor error: {}", e);

                    if restarts >= MAX_THREAD_RESTARTS {
                        log_indented!("Screensaver changes will not be followed");
                        break;
                    }
                    restarts += 1;
                    log_indented!(
                        "Will restart screensaver monitor (attempt {}/{})",
                        restarts,
                        MAX_THREAD_RESTARTS
                    );
                    thread::sleep(Duration::from_millis(RESTART_DELAY_MS));
                }
            }
        }
    });
}

/// Turns successive player polls into events.
struct PlaybackTracker {
    previous: PlaybackStatus,
}

impl PlaybackTracker {
    fn new() -> Self {
        Self {
            previous: PlaybackStatus::Stopped,
        }
    }

    /// Feed one poll result. A failed poll is passed back and leaves the last known
    /// status untouched; `Ok(None)` means no matching player is running.
    fn update(&mut self, polled: Result<Option<PlaybackStatus>>) -> Result<Option<PlayerEvent>> {
        let current = polled?.unwrap_or(PlaybackStatus::Stopped);
        let event = playback_event(self.previous, current);
        self.previous = current;
        Ok(event)
    }
}

fn monitor_player(
    connection: Connection,
    signal_sender: Sender<SignalMessage>,
    player: PlayerSelector,
    debug_enabled: bool,
) {
    let mut tracker = PlaybackTracker::new();
    let mut last_error: Option<String> = None;

    loop {
        let selector = current_selector(&player);
        let previous = tracker.previous;

        match tracker.update(query_playback_status(&connection, &selector)) {
            Ok(event) => {
                last_error = None;
                if let Some(event) = event {
                    if debug_enabled {
                        log_pipe!();
                        log_debug!("Playback status {:?} → {:?}", previous, tracker.previous);
                    }
                    if signal_sender.send(SignalMessage::Player(event)).is_err() {
                        // Main loop is gone
                        return;
                    }
                }
            }
            Err(e) => {
                let message = format!("{e:#}");
                if debug_enabled && last_error.as_deref() != Some(message.as_str()) {
                    log_pipe!();
                    log_debug!("Player query failed: {}", message);
                }
                last_error = Some(message);
            }
        }

        thread::sleep(Duration::from_millis(PLAYER_POLL_INTERVAL_MS));
    }
}

fn monitor_screensaver(
    connection: &Connection,
    signal_sender: &Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let proxy = ScreenSaverProxyBlocking::new(connection)
        .context("Failed to create ScreenSaver proxy")?;

    let mut changes = proxy
        .receive_active_changed()
        .context("Failed to subscribe to ScreenSaver ActiveChanged")?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Subscribed to org.freedesktop.ScreenSaver ActiveChanged");
    }

    loop {
        let Some(signal) = changes.next() else {
            anyhow::bail!("ActiveChanged subscription ended");
        };

        let active = match signal.args() {
            Ok(args) => args.active,
            Err(e) => {
                if debug_enabled {
                    log_debug!("Failed to parse ActiveChanged: {}", e);
                }
                continue;
            }
        };

        let event = if active {
            SystemEvent::ScreensaverActivated
        } else {
            SystemEvent::ScreensaverDeactivated
        };

        if signal_sender.send(SignalMessage::System(event)).is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackStatus::*;

    #[test]
    fn status_transitions_map_to_events() {
        assert_eq!(playback_event(Stopped, Playing), Some(PlayerEvent::Started));
        assert_eq!(playback_event(Paused, Playing), Some(PlayerEvent::Resumed));
        assert_eq!(playback_event(Playing, Paused), Some(PlayerEvent::Paused));
        assert_eq!(playback_event(Playing, Stopped), Some(PlayerEvent::Stopped));
        assert_eq!(playback_event(Paused, Stopped), Some(PlayerEvent::Stopped));
    }

    #[test]
    fn unchanged_status_is_silent() {
        for status in [Playing, Paused, Stopped] {
            assert_eq!(playback_event(status, status), None);
        }
    }

    #[test]
    fn unknown_status_counts_as_stopped() {
        assert_eq!(PlaybackStatus::parse("Buffering?"), Stopped);
        assert_eq!(PlaybackStatus::parse("Playing"), Playing);
    }

    #[test]
    fn failed_poll_keeps_last_status() {
        let mut tracker = PlaybackTracker::new();
        assert_eq!(tracker.update(Ok(Some(Playing))).unwrap(), Some(PlayerEvent::Started));

        assert!(tracker.update(Err(anyhow::anyhow!("no reply"))).is_err());
        assert_eq!(tracker.previous, Playing);

        // Recovery is silent, no stop/start pair
        assert_eq!(tracker.update(Ok(Some(Playing))).unwrap(), None);
        // Player gone from the bus
        assert_eq!(tracker.update(Ok(None)).unwrap(), Some(PlayerEvent::Stopped));
    }

    #[test]
    fn most_active_player_wins() {
        assert_eq!(pick_status(&[Stopped, Playing, Paused]), Playing);
        assert_eq!(pick_status(&[Stopped, Paused]), Paused);
        assert_eq!(pick_status(&[Stopped, Stopped]), Stopped);
        assert_eq!(pick_status(&[]), Stopped);
    }

    #[test]
    fn player_selection() {
        assert!(matches_player("org.mpris.MediaPlayer2.vlc", "auto"));
        assert!(matches_player("org.mpris.MediaPlayer2.vlc", "vlc"));
        assert!(matches_player("org.mpris.MediaPlayer2.vlc.instance42", "vlc"));
        assert!(!matches_player("org.mpris.MediaPlayer2.vlcx", "vlc"));
        assert!(!matches_player("org.mpris.MediaPlayer2.mpv", "vlc"));
        assert!(!matches_player("org.freedesktop.Notifications", "auto"));
    }

    #[test]
    fn fixed_probe_reports_latest_value() {
        let probe = FixedPlayerProbe::new(PlayerObservation::idle());
        probe.set(PlayerObservation::playing());
        assert_eq!(probe.observe(), PlayerObservation::playing());
    }
}
