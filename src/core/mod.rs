//! Core application loop.
//!
//! `Core` owns the transition engine and the port manager and is the only consumer of
//! the message channel. Each iteration waits for a message with `recv_timeout`, hands
//! it to the engine, sends whatever commands come back, then re-checks the blackout
//! window. The timeout is the blackout poll interval, so blackout edges are noticed
//! even when nothing else happens.

pub mod port;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::{
    common::utils::private_path,
    config::Config,
    io::dbus::{PlayerProbe, PlayerSelector},
    io::lock::LockFile,
    io::signals::{SignalMessage, SignalState},
    lighting::{PlayerObserver, SystemObserver, TransitionEngine},
    time_source::TimeSource,
};

pub use port::PortManager;

/// Everything `Core` needs, bundled to keep the constructor readable.
pub struct CoreParams {
    pub port: PortManager,
    pub config: Config,
    /// File re-read on every reload request.
    pub config_path: PathBuf,
    pub signal_state: SignalState,
    pub probe: Box<dyn PlayerProbe>,
    pub time_source: Box<dyn TimeSource>,
    /// Shared with the player monitor so a reload can switch players.
    pub player_selector: Option<PlayerSelector>,
    pub debug_enabled: bool,
    pub lock: Option<LockFile>,
}

pub struct Core {
    port: PortManager,
    engine: TransitionEngine,
    config_path: PathBuf,
    signal_state: SignalState,
    probe: Box<dyn PlayerProbe>,
    time_source: Box<dyn TimeSource>,
    player_selector: Option<PlayerSelector>,
    debug_enabled: bool,
    lock: Option<LockFile>,
}

impl Core {
    /// Build the core, deriving the initial mode from the live player state.
    pub fn new(params: CoreParams) -> Self {
        let live = params.probe.observe();
        let now = params.time_source.time_of_day();
        let engine =
            TransitionEngine::new(Arc::new(params.config), live, now, params.debug_enabled);

        Self {
            port: params.port,
            engine,
            config_path: params.config_path,
            signal_state: params.signal_state,
            probe: params.probe,
            time_source: params.time_source,
            player_selector: params.player_selector,
            debug_enabled: params.debug_enabled,
            lock: params.lock,
        }
    }

    /// Open the port, bring the lights to their current targets and run until shutdown.
    ///
    /// Fails if the port cannot be opened at startup.
    pub fn execute(mut self) -> Result<()> {
        self.engine.config().log_config(Some(&self.config_path));

        if !self.port.open() {
            self.release_lock();
            anyhow::bail!(
                "Could not open lighting controller on {}",
                self.port.settings().port
            );
        }

        log_block_start!("Initial lighting mode: {}", self.engine.mode());
        self.reinitialize();

        self.main_loop();

        log_block_start!("Shutting down, turning all lights off");
        let commands = self.engine.shutdown();
        self.port.send(&commands);
        self.port.release();
        self.release_lock();

        Ok(())
    }

    fn main_loop(&mut self) {
        while self.signal_state.is_running() {
            let poll = Duration::from_secs(self.engine.config().blackout_poll_interval);

            match self.signal_state.signal_receiver.recv_timeout(poll) {
                Ok(message) => {
                    if !self.handle_message(message) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if self.debug_enabled {
                        log_debug!("Message channel closed");
                    }
                    break;
                }
            }

            let now = self.time_source.time_of_day();
            let commands = self.engine.check_blackout(now);
            self.port.send(&commands);
        }
    }

    /// Returns `false` when the loop should stop.
    fn handle_message(&mut self, message: SignalMessage) -> bool {
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Received {:?}", message);
        }

        match message {
            SignalMessage::Player(event) => {
                let commands = self.engine.on_player_event(event);
                self.port.send(&commands);
            }
            SignalMessage::System(event) => {
                let commands = self.engine.on_system_event(event);
                self.port.send(&commands);
            }
            SignalMessage::Reload => self.reload_config(),
            SignalMessage::Shutdown => return false,
        }
        true
    }

    /// Re-read the config file. A broken file leaves the current config in place.
    fn reload_config(&mut self) {
        match Config::load_from_path(&self.config_path) {
            Ok(config) => self.apply_config(config),
            Err(e) => {
                log_pipe!();
                log_warning!("Failed to reload configuration: {:#}", e);
                log_indented!(
                    "Keeping previous configuration; fix {} and save again",
                    private_path(&self.config_path)
                );
            }
        }
    }

    fn apply_config(&mut self, config: Config) {
        if let Some(selector) = &self.player_selector
            && let Ok(mut player) = selector.write()
        {
            player.clone_from(&config.player);
        }

        config.log_config(None);
        let serial_changed = config.serial != *self.port.settings();
        let config = Arc::new(config);

        if serial_changed {
            let settings = config.serial.clone();
            self.engine.replace_config(config);
            if self.port.reopen(settings) {
                self.reinitialize();
            } else {
                log_indented!("Lights stay off until the port settings are fixed");
            }
            return;
        }

        let live = self.probe.observe();
        let now = self.time_source.time_of_day();
        let commands = self.engine.on_settings_changed(config, live, now);
        self.port.send(&commands);
    }

    /// Fade every enabled channel up from zero to its current target.
    fn reinitialize(&mut self) {
        let live = self.probe.observe();
        let now = self.time_source.time_of_day();
        let commands = self.engine.reinitialize(live, now);
        self.port.send(&commands);
    }

    fn release_lock(&mut self) {
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
    }
}
