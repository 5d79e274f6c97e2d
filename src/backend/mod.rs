//! Transport layer between the engine and the lighting controller.
//!
//! The rest of the application only sees `LightingBackend`: open a link, write one
//! command line at a time, close it. `serial` talks to real hardware through the
//! `serialport` crate; `dry_run` logs the lines instead, for running without a
//! controller attached.

use thiserror::Error;

use crate::config::SerialSettings;

pub mod dry_run;
pub mod serial;

pub use dry_run::DryRunBackend;
pub use serial::SerialBackend;

/// Failures of the controller link.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {port} at {baud_rate} baud")]
    Open {
        port: String,
        baud_rate: u32,
        #[source]
        source: serialport::Error,
    },
    #[error("write to controller failed")]
    Write(#[from] std::io::Error),
    #[error("port is not open")]
    Closed,
    #[error("failed to close port cleanly")]
    Close(#[source] std::io::Error),
}

/// A line-oriented link to the lighting controller.
#[cfg_attr(test, mockall::automock)]
pub trait LightingBackend: Send {
    /// Open the link. Any previously open link is dropped first.
    fn open(&mut self, settings: &SerialSettings) -> Result<(), TransportError>;

    /// Flush and release the link. Closing a closed link is a no-op.
    fn close(&mut self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    /// Write one command followed by a newline.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    fn backend_name(&self) -> &'static str;
}

/// Pick the backend for this run.
pub fn create_backend(dry_run: bool, debug_enabled: bool) -> Box<dyn LightingBackend> {
    if dry_run {
        Box::new(DryRunBackend::new(debug_enabled))
    } else {
        Box::new(SerialBackend::new(debug_enabled))
    }
}
