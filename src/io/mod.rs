// External I/O operations module
pub mod dbus; // Media player and screensaver monitoring
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling and the main-loop message channel
