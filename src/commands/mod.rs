//! One-shot CLI commands that talk to a running instance.

pub mod help;
pub mod reload;
pub mod stop;
