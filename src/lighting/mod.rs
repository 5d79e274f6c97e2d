//! Mode resolution and transition logic for the lighting channels.
//!
//! Everything in this module is pure with respect to I/O: handlers take the current
//! configuration snapshot and observations, and return the commands to send. The
//! serial side lives in `backend` and `core::port`.
//!
//! - `encoder`: percent → wire level, and the `set`/fade/`alloff` command grammar
//! - `channel`: the fixed set of lighting zones and their per-channel settings
//! - `mode`: lighting modes and the precedence rules that pick one
//! - `brightness`: the (mode, channel) → percent table
//! - `blackout`: daily time windows that force channels to zero
//! - `engine`: the state machine tying the above together
//! - `observer`: host-facing event types and observer traits

pub mod blackout;
pub mod brightness;
pub mod channel;
pub mod encoder;
pub mod engine;
pub mod mode;
pub mod observer;

pub use blackout::BlackoutWindow;
pub use brightness::{BrightnessLevels, target_percent};
pub use channel::{Channel, ChannelConfig};
pub use encoder::{FadeMethod, TransitionCommand};
pub use engine::TransitionEngine;
pub use mode::{Mode, PlayerObservation, resolve_effective_mode, resolve_mode};
pub use observer::{PlayerEvent, PlayerObserver, SystemEvent, SystemObserver};
