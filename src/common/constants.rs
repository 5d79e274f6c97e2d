//! Application-wide constants: defaults, validation limits and protocol timing.

// # Application defaults

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_FADE_DURATION: f64 = 3.0; // seconds
pub const DEFAULT_DIM_ON_PAUSE: bool = true;
pub const DEFAULT_DIM_ON_SCREENSAVER: bool = true;
pub const DEFAULT_BLACKOUT_POLL_INTERVAL: u64 = 1; // seconds
pub const DEFAULT_PLAYER: &str = "auto";

// Per-mode brightness defaults (percent), shared by every channel
pub const DEFAULT_NORMAL_BRIGHTNESS: i64 = 100;
pub const DEFAULT_PLAYING_BRIGHTNESS: i64 = 0;
pub const DEFAULT_PAUSED_BRIGHTNESS: i64 = 40;
pub const DEFAULT_SCREENSAVER_BRIGHTNESS: i64 = 20;

// Controller addresses used when a channel table omits `address`
pub const DEFAULT_HOUSE_ADDRESS: u16 = 1;
pub const DEFAULT_AISLE_ADDRESS: u16 = 2;
pub const DEFAULT_AMBIENT_ADDRESS: u16 = 3;

// # Validation limits

pub const MINIMUM_BRIGHTNESS: i64 = 0;
pub const MAXIMUM_BRIGHTNESS: i64 = 100;

pub const MINIMUM_FADE_DURATION: f64 = 0.0;
pub const MAXIMUM_FADE_DURATION: f64 = 600.0;

pub const MINIMUM_BLACKOUT_POLL_INTERVAL: u64 = 1;
pub const MAXIMUM_BLACKOUT_POLL_INTERVAL: u64 = 300;

pub const MINIMUM_BAUD_RATE: u32 = 300;
pub const MAXIMUM_BAUD_RATE: u32 = 4_000_000;

// # Controller protocol

/// Largest level the controller accepts.
pub const MAX_WIRE_LEVEL: u8 = 255;

/// The controller reboots when the port is opened; commands sent before this are lost.
pub const PORT_SETTLE_DELAY_MS: u64 = 2000;

/// Pause between closing and reopening the port after a serial settings change.
pub const PORT_REOPEN_DELAY_MS: u64 = 200;

/// Serial write timeout.
pub const SERIAL_TIMEOUT_MS: u64 = 500;

// # Process

pub const EXIT_FAILURE: i32 = 1;

/// How long `stop` waits for the running instance to exit.
pub const STOP_TIMEOUT_MS: u64 = 3000;
