//! Unix signal handling and the message channel feeding the main loop.
//!
//! Every producer (signal thread, D-Bus monitors, config watcher) sends a
//! `SignalMessage` into one `mpsc` channel; `Core` is the single consumer.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, channel},
    thread,
};

use crate::lighting::{PlayerEvent, SystemEvent};

/// Everything the main loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    /// Playback state change from the media player monitor.
    Player(PlayerEvent),
    /// Screensaver change from the desktop.
    System(SystemEvent),
    /// Reload the configuration (SIGUSR2, SIGHUP or a file change).
    Reload,
    /// Turn the lights off and exit (SIGINT, SIGTERM).
    Shutdown,
}

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared once shutdown has been requested.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned by every producer thread.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// A channel with no OS signal handlers attached. Used by tests and embedders
    /// that deliver events themselves.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Register handlers for SIGINT, SIGTERM, SIGHUP and SIGUSR2 and start forwarding
/// them into a fresh message channel.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let message = match sig {
                SIGUSR2 | SIGHUP => {
                    log_pipe!();
                    log_info!("Received configuration reload signal");
                    SignalMessage::Reload
                }
                SIGINT | SIGTERM => {
                    if debug_enabled {
                        log_pipe!();
                        log_debug!(
                            "Received {}, shutting down",
                            if sig == SIGINT { "SIGINT" } else { "SIGTERM" }
                        );
                    }
                    running.store(false, Ordering::SeqCst);
                    SignalMessage::Shutdown
                }
                _ => continue,
            };

            let shutting_down = message == SignalMessage::Shutdown;
            if sender.send(message).is_err() || shutting_down {
                break;
            }
        }
    });

    Ok(state)
}
