//! Serial port lifecycle: open, settle, send, close.
//!
//! The controller resets when its port is opened and ignores input for a moment, so
//! every successful open waits out a settle delay before anything is sent. Transport
//! failures never propagate past this module; they are logged and the caller decides
//! what to do from the returned flag.

use std::thread;
use std::time::Duration;

use crate::backend::{LightingBackend, TransportError};
use crate::common::constants::{PORT_REOPEN_DELAY_MS, PORT_SETTLE_DELAY_MS};
use crate::config::SerialSettings;
use crate::lighting::TransitionCommand;

pub struct PortManager {
    backend: Box<dyn LightingBackend>,
    settings: SerialSettings,
    settle_delay: Duration,
    reopen_delay: Duration,
    debug_enabled: bool,
}

impl PortManager {
    pub fn new(
        backend: Box<dyn LightingBackend>,
        settings: SerialSettings,
        debug_enabled: bool,
    ) -> Self {
        Self {
            backend,
            settings,
            settle_delay: Duration::from_millis(PORT_SETTLE_DELAY_MS),
            reopen_delay: Duration::from_millis(PORT_REOPEN_DELAY_MS),
            debug_enabled,
        }
    }

    /// Override both delays, mostly so tests do not sleep.
    pub fn with_delays(mut self, settle_delay: Duration, reopen_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self.reopen_delay = reopen_delay;
        self
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Open the port with the current settings and wait for the controller to settle.
    ///
    /// Returns `false` when the port could not be opened. There is no automatic retry.
    pub fn open(&mut self) -> bool {
        if self.backend.is_open() {
            self.close();
        }

        match self.backend.open(&self.settings) {
            Ok(()) => {
                log_block_start!(
                    "Connected to lighting controller on {}",
                    self.settings.port
                );
                if !self.settle_delay.is_zero() {
                    thread::sleep(self.settle_delay);
                }
                true
            }
            Err(e) => {
                log_pipe!();
                log_critical!("{}", describe(&e));
                log_indented!("Check that the controller is plugged in and the port is correct");
                false
            }
        }
    }

    /// Turn all lights off and release the port. Errors are logged, not returned.
    pub fn close(&mut self) {
        if !self.backend.is_open() {
            return;
        }

        if let Err(e) = self.backend.write_line(&TransitionCommand::AllOff.encode()) {
            log_warning!("Failed to send alloff before closing: {}", describe(&e));
        }
        self.release();
    }

    /// Release the port without sending anything.
    pub fn release(&mut self) {
        if !self.backend.is_open() {
            return;
        }
        if let Err(e) = self.backend.close() {
            log_warning!("{}", describe(&e));
        }

        if self.debug_enabled {
            log_debug!("Closed {}", self.settings.port);
        }
    }

    /// Close, pause briefly, then open with `settings`.
    pub fn reopen(&mut self, settings: SerialSettings) -> bool {
        let was_open = self.backend.is_open();
        self.close();
        self.settings = settings;

        if was_open && !self.reopen_delay.is_zero() {
            thread::sleep(self.reopen_delay);
        }
        self.open()
    }

    /// Write each command. A failed write is logged and the rest are still attempted.
    pub fn send(&mut self, commands: &[TransitionCommand]) {
        if commands.is_empty() {
            return;
        }

        if !self.backend.is_open() {
            log_warning!(
                "Port {} is not open, dropping {} command(s)",
                self.settings.port,
                commands.len()
            );
            return;
        }

        for command in commands {
            let line = command.encode();
            if self.debug_enabled {
                log_debug!("Sending: {}", line);
            }
            if let Err(e) = self.backend.write_line(&line) {
                log_error!("Failed to send '{}': {}", line, describe(&e));
            }
        }
    }
}

/// Error text including the underlying cause.
fn describe(error: &TransportError) -> String {
    match std::error::Error::source(error) {
        Some(source) => format!("{error}: {source}"),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockLightingBackend;
    use crate::lighting::Channel;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn manager(backend: MockLightingBackend) -> PortManager {
        PortManager::new(Box::new(backend), SerialSettings::default(), false)
            .with_delays(Duration::ZERO, Duration::ZERO)
    }

    fn fade() -> TransitionCommand {
        TransitionCommand::Fade {
            channel: Channel::House,
            address: 1,
            start: 30,
            end: 80,
            duration_ms: 3000,
        }
    }

    #[test]
    fn open_failure_is_reported() {
        let mut backend = MockLightingBackend::new();
        backend.expect_is_open().return_const(false);
        backend.expect_open().times(1).returning(|settings| {
            Err(TransportError::Open {
                port: settings.port.clone(),
                baud_rate: settings.baud_rate,
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
            })
        });

        assert!(!manager(backend).open());
    }

    #[test]
    fn send_writes_every_command_in_order() {
        let mut backend = MockLightingBackend::new();
        let mut seq = Sequence::new();
        backend.expect_is_open().return_const(true);
        backend
            .expect_write_line()
            .with(eq("exponential 1,77,204,3000"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_write_line()
            .with(eq("alloff"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        manager(backend).send(&[fade(), TransitionCommand::AllOff]);
    }

    #[test]
    fn failed_write_does_not_stop_the_batch() {
        let mut backend = MockLightingBackend::new();
        backend.expect_is_open().return_const(true);
        backend
            .expect_write_line()
            .with(eq("exponential 1,77,204,3000"))
            .times(1)
            .returning(|_| {
                Err(TransportError::Write(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "timed out",
                )))
            });
        backend
            .expect_write_line()
            .with(eq("alloff"))
            .times(1)
            .returning(|_| Ok(()));

        manager(backend).send(&[fade(), TransitionCommand::AllOff]);
    }

    #[test]
    fn send_to_closed_port_writes_nothing() {
        let mut backend = MockLightingBackend::new();
        backend.expect_is_open().return_const(false);
        backend.expect_write_line().never();

        manager(backend).send(&[fade()]);
    }

    #[test]
    fn close_sends_alloff_then_releases() {
        let mut backend = MockLightingBackend::new();
        let mut seq = Sequence::new();
        backend.expect_is_open().return_const(true);
        backend
            .expect_write_line()
            .with(eq("alloff"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_close()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        manager(backend).close();
    }

    #[test]
    fn reopen_uses_new_settings() {
        let mut backend = MockLightingBackend::new();
        backend.expect_is_open().return_const(false);
        backend
            .expect_open()
            .withf(|settings| settings.port == "/dev/ttyUSB1" && settings.baud_rate == 115_200)
            .times(1)
            .returning(|_| Ok(()));

        let mut port = manager(backend);
        assert!(port.reopen(SerialSettings {
            port: "/dev/ttyUSB1".to_string(),
            baud_rate: 115_200,
        }));
        assert_eq!(port.settings().port, "/dev/ttyUSB1");
    }
}
