//! # houselights
//!
//! Theater lighting automation: dims the room lights through a serial lighting
//! controller as media playback starts, pauses and stops.
//!
//! - **Entry point**: `Houselights` wires the daemon together and runs it
//! - **Core**: `core` owns the main loop and the serial port
//! - **Lighting**: `lighting` holds the mode resolver, the transition engine and the
//!   controller command encoder
//! - **Backends**: `backend` with the serial transport and a dry-run transport
//! - **Configuration**: `config` for TOML settings with hot reload
//! - **Infrastructure**: `io` for D-Bus monitoring, signals and the lock file

#[macro_use]
pub mod common;

pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod lighting;
pub mod time_source;

mod houselights;

pub use houselights::Houselights;
