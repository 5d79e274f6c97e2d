//! Implementation of the stop command.
//!
//! Sends SIGTERM to the running instance, which turns all lights off before exiting,
//! and waits for it to go away.

use anyhow::Result;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::thread;
use std::time::Duration;

use crate::common::constants::STOP_TIMEOUT_MS;
use crate::common::utils::is_process_running;

const POLL_INTERVAL_MS: u64 = 100;

/// Result of a stop command operation.
#[derive(Debug, PartialEq)]
pub enum StopResult {
    Stopped,
    NoInstanceRunning,
    /// Signal sent but the process was still alive at the timeout
    StillRunning,
    Failed(String),
}

pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    match stop_running_instance(debug_enabled) {
        StopResult::Stopped => {
            log_pipe!();
            log_info!("Process terminated successfully");
        }
        StopResult::NoInstanceRunning => {
            log_error_exit!("houselights isn't running");
            return Ok(());
        }
        StopResult::StillRunning => {
            log_pipe!();
            log_warning!("Process did not terminate within the expected time");
            log_indented!("The termination signal was sent, it may still be shutting down");
        }
        StopResult::Failed(e) => {
            log_error_exit!("Failed to terminate instance: {}", e);
            return Ok(());
        }
    }

    log_end!();
    Ok(())
}

fn stop_running_instance(debug_enabled: bool) -> StopResult {
    let Some(pid) = crate::io::lock::read_running_pid() else {
        return StopResult::NoInstanceRunning;
    };

    log_block_start!("Stopping houselights (PID: {})...", pid);

    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        return StopResult::Failed(e.to_string());
    }
    if debug_enabled {
        log_debug!("SIGTERM sent to process {}", pid);
    }

    for _ in 0..STOP_TIMEOUT_MS / POLL_INTERVAL_MS {
        if !is_process_running(pid) {
            return StopResult::Stopped;
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }

    StopResult::StillRunning
}

/// Display detailed help for the stop command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("stop - Turn the lights off and stop the running instance");
    log_block_start!("Usage: houselights stop");
    log_block_start!("Description:");
    log_indented!("Sends SIGTERM to the daemon. It sends 'alloff' to the controller,");
    log_indented!("closes the serial port and exits.");
    log_end!();
}
