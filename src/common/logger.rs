//! Structured logging with box-drawing decorations.
//!
//! Output follows a vertical "pipe" layout so a long-running daemon log reads as a
//! sequence of blocks:
//!
//! ```text
//! ┏ houselights v0.3.0 ━━╸
//! ┃
//! ┣ Loaded configuration
//! ┃   Serial: /dev/ttyACM0 @ 9600 baud
//! ┃
//! ┣[INFO] Playback started
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (major state change, phase, event).
//! - `log_decorated!` continues a block or prints a single standalone status line.
//! - `log_indented!` prints details belonging to the previous line.
//! - `log_pipe!` inserts spacing, mainly before `log_info!`/`log_warning!`/`log_error!`
//!   lines that start their own block.
//! - `log_version!` and `log_end!` open and close the whole log.
//!
//! When file logging is active (`--log <file>`), lines are routed to a writer thread,
//! ANSI colours are stripped, and every line gets a wall-clock timestamp.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Line(String),
    Shutdown,
}

/// Runtime switches for the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable all log output.
    ///
    /// Tests use this to keep the engine quiet.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all further output to `file_path`.
    ///
    /// The returned guard flushes and joins the writer thread when dropped, so keep it
    /// alive for the lifetime of the process.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("File logging already started"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)?;

            while let Ok(LogMessage::Line(text)) = rx.recv() {
                file.write_all(text.as_bytes())?;
            }
            file.flush()?;

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix used for file output, empty on a terminal.
    pub fn timestamp_prefix() -> String {
        if LOG_CHANNEL.get().is_some() {
            format!("[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Keeps the file writer thread alive.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequences we emit always end in 'm'
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Write one already-decorated line. Public for macro access.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Line(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Shared expansion for the decorated logging macros: `$lead` goes before the message on
/// the same line, `$spacer` controls whether an empty pipe line precedes it.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($spacer:expr, $lead:expr, $($arg:tt)+) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::timestamp_prefix();
            let message = format!($($arg)+);
            let formatted = if $spacer {
                format!("{prefix}┃\n{prefix}{}{message}\n", $lead)
            } else {
                format!("{prefix}{}{message}\n", $lead)
            };
            $crate::common::logger::write_output(&formatted);
        }
    }};
}

/// Log a message that continues the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┣ ", $($arg)+) };
}

/// Log a detail line nested under the previous message.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┃   ", $($arg)+) };
}

/// Log a new block: a spacing pipe followed by the message.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!(true, "┣ ", $($arg)+) };
}

/// Log an empty pipe line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => { $crate::__log_line!(false, "┃", "") };
}

/// Log the startup header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!(
            false,
            "┏ ",
            "houselights v{} ━━╸",
            env!("CARGO_PKG_VERSION")
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => { $crate::__log_line!(false, "╹", "") };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┣[\x1b[32mINFO\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┣[\x1b[36mDEBUG\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┣[\x1b[33mWARNING\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┣[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_line!(false, "┣[\x1b[31mCRITICAL\x1b[0m] ", $($arg)+) };
}

/// Log an error that terminates the current flow (`┗` corner).
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!(true, "┗[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}
