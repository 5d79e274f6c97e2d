//! Implementation of the reload command.
//!
//! Validates the configuration first so mistakes are reported to the user here rather
//! than only in the daemon's log, then sends SIGUSR2 to the running instance.

use anyhow::Result;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::common::utils::private_path;
use crate::config::Config;

pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let config_path = Config::get_config_path()?;
    if let Err(e) = Config::load_from_path(&config_path) {
        log_pipe!();
        log_error!("Configuration is invalid, not reloading");
        log_indented!("{}: {:#}", private_path(&config_path), e);
        log_end!();
        return Ok(());
    }

    let Some(pid) = crate::io::lock::read_running_pid() else {
        log_error_exit!("houselights isn't running");
        return Ok(());
    };

    match kill(Pid::from_raw(pid as i32), Signal::SIGUSR2) {
        Ok(()) => {
            log_block_start!("Sent reload signal to houselights (PID: {})", pid);
            if debug_enabled {
                log_debug!("Configuration: {}", private_path(&config_path));
            }
        }
        Err(e) => {
            log_pipe!();
            log_error!("Failed to signal running instance: {}", e);
        }
    }

    log_end!();
    Ok(())
}

/// Display detailed help for the reload command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("reload - Apply configuration changes to the running instance");
    log_block_start!("Usage: houselights reload");
    log_block_start!("Description:");
    log_indented!("Checks the configuration file and asks the running daemon to re-read it.");
    log_indented!("Brightness changes are applied immediately; a changed serial port");
    log_indented!("or baud rate reconnects to the controller.");
    log_pipe!();
    log_info!("Saving the configuration file also triggers a reload automatically.");
    log_end!();
}
