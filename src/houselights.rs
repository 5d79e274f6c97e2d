//! Application coordinator for the daemon.
//!
//! Acquires the single-instance lock, loads the configuration, starts the host
//! monitors and the config watcher, and hands everything to `Core`.

use anyhow::Result;
use std::sync::{Arc, RwLock};

use crate::{
    backend::create_backend,
    config::{self, Config},
    core::{Core, CoreParams, PortManager},
    io::dbus::{self, DbusPlayerProbe, PlayerSelector},
    io::lock,
    io::signals::setup_signal_handler,
    time_source::RealTimeSource,
};

/// Builder for configuring and running the daemon.
///
/// ```no_run
/// use houselights::Houselights;
///
/// # fn main() -> anyhow::Result<()> {
/// Houselights::new(false).dry_run(true).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Houselights {
    debug_enabled: bool,
    dry_run: bool,
    create_lock: bool,
}

impl Houselights {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            dry_run: false,
            create_lock: true,
        }
    }

    /// Log controller commands instead of opening the serial port.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Skip single-instance enforcement.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Run until SIGINT/SIGTERM. Returns an error if the controller cannot be opened.
    pub fn run(self) -> Result<()> {
        log_version!();

        let lock = if self.create_lock {
            match lock::acquire_lock()? {
                Some(lock) => Some(lock),
                None => {
                    let pid = lock::read_running_pid()
                        .map(|pid| pid.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    log_pipe!();
                    log_warning!("houselights is already running (PID: {})", pid);
                    log_indented!("Use 'houselights reload' to apply configuration changes");
                    log_indented!("or 'houselights stop' to shut it down");
                    log_end!();
                    return Ok(());
                }
            }
        } else {
            None
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let config_path = config::get_config_path()?;
        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                if let Some(lock) = lock {
                    lock.release();
                }
                return Err(e.context("Configuration failed"));
            }
        };

        let player_selector: PlayerSelector = Arc::new(RwLock::new(config.player.clone()));
        dbus::start_host_monitors(
            signal_state.signal_sender.clone(),
            player_selector.clone(),
            self.debug_enabled,
        );

        if let Err(e) = config::start_config_watcher(
            signal_state.signal_sender.clone(),
            config_path.clone(),
            self.debug_enabled,
        ) {
            log_pipe!();
            log_warning!("Config file watching unavailable: {:#}", e);
            log_indented!("Use 'houselights reload' after editing the configuration");
        }

        let backend = create_backend(self.dry_run, self.debug_enabled);
        log_block_start!("Lighting backend: {}", backend.backend_name());
        let port = PortManager::new(backend, config.serial.clone(), self.debug_enabled);

        let core = Core::new(CoreParams {
            port,
            config,
            config_path,
            signal_state,
            probe: Box::new(DbusPlayerProbe::new(
                player_selector.clone(),
                self.debug_enabled,
            )),
            time_source: Box::new(RealTimeSource),
            player_selector: Some(player_selector),
            debug_enabled: self.debug_enabled,
            lock,
        });

        core.execute()?;

        log_end!();
        Ok(())
    }
}
