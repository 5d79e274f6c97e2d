//! Backend that logs commands instead of sending them.

use std::sync::{Arc, Mutex};

use super::{LightingBackend, TransportError};
use crate::config::SerialSettings;

/// Pretends to be a controller. Every written line is logged and kept in a shared
/// buffer that `sent_log` hands out, so tests can inspect what went over the "wire".
pub struct DryRunBackend {
    open: bool,
    sent: Arc<Mutex<Vec<String>>>,
    debug_enabled: bool,
}

impl DryRunBackend {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            open: false,
            sent: Arc::new(Mutex::new(Vec::new())),
            debug_enabled,
        }
    }

    pub fn sent_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }
}

impl LightingBackend for DryRunBackend {
    fn open(&mut self, settings: &SerialSettings) -> Result<(), TransportError> {
        log_decorated!(
            "Dry run: not opening {} ({} baud)",
            settings.port,
            settings.baud_rate
        );
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        if !self.debug_enabled {
            // Commands are logged at debug level by the port manager already
            log_indented!("→ {}", line);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(line.to_string());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_lines_while_open() {
        let mut backend = DryRunBackend::new(false);
        let log = backend.sent_log();

        assert!(backend.write_line("alloff").is_err());
        backend.open(&SerialSettings::default()).unwrap();
        backend.write_line("set 1,255").unwrap();
        backend.close().unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["set 1,255".to_string()]);
        assert!(!backend.is_open());
    }
}
