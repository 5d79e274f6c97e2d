//! Serial port backend.

use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::{LightingBackend, TransportError};
use crate::common::constants::SERIAL_TIMEOUT_MS;
use crate::config::SerialSettings;

pub struct SerialBackend {
    port: Option<Box<dyn SerialPort>>,
    debug_enabled: bool,
}

impl SerialBackend {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            port: None,
            debug_enabled,
        }
    }
}

impl LightingBackend for SerialBackend {
    fn open(&mut self, settings: &SerialSettings) -> Result<(), TransportError> {
        self.port = None;

        let port = serialport::new(&settings.port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(SERIAL_TIMEOUT_MS))
            .open()
            .map_err(|source| TransportError::Open {
                port: settings.port.clone(),
                baud_rate: settings.baud_rate,
                source,
            })?;

        if self.debug_enabled {
            log_debug!(
                "Opened {} ({} baud, 8N1)",
                settings.port,
                settings.baud_rate
            );
        }

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self.port.take() {
            Some(mut port) => port.flush().map_err(TransportError::Close),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        port.write_all(format!("{line}\n").as_bytes())?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "serial"
    }
}
