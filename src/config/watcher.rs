//! Hot reload of the configuration file.
//!
//! Watches the directory containing `houselights.toml` (editors often replace the file
//! rather than write it in place) and sends `SignalMessage::Reload` to the main loop
//! when it changes.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Editors write files in several steps. A reload is sent once the file has been
/// quiet for this long.
const DEBOUNCE_MS: u64 = 500;

pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, config_path: PathBuf, debug_enabled: bool) -> Self {
        Self {
            signal_sender,
            config_path,
            debug_enabled,
        }
    }

    /// Spawn the watcher thread. Returns once the watch is registered.
    pub fn start(self) -> Result<()> {
        let watch_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .context("Config path has no parent directory")?;

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&watch_dir)))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching {} for changes", private_path(&self.config_path));
        }

        let ConfigWatcher {
            signal_sender,
            config_path,
            debug_enabled,
        } = self;

        thread::spawn(move || {
            // The watcher stops when dropped
            let _watcher = watcher;
            let quiet = Duration::from_millis(DEBOUNCE_MS);

            while next_settled_change(&rx, &config_path, quiet) {
                if debug_enabled {
                    log_pipe!();
                    log_debug!("Configuration file change detected");
                }

                if signal_sender.send(SignalMessage::Reload).is_err() {
                    // Main loop is gone
                    break;
                }
            }
        });

        Ok(())
    }
}

/// Block until the config file changed and then saw no further change for `quiet`.
///
/// Returns `false` once the event source is gone with no change pending.
fn next_settled_change(rx: &Receiver<Event>, config_path: &Path, quiet: Duration) -> bool {
    loop {
        match rx.recv() {
            Ok(event) if event_affects_config(&event, config_path) => break,
            Ok(_) => continue,
            Err(_) => return false,
        }
    }

    let mut deadline = Instant::now() + quiet;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(event) => {
                if event_affects_config(&event, config_path) {
                    deadline = Instant::now() + quiet;
                }
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return true,
        }
    }
}

/// Whether a filesystem event touches the config file, including editor temp files
/// that share its name as a prefix.
fn event_affects_config(event: &Event, config_path: &Path) -> bool {
    let Some(config_name) = config_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    event.paths.iter().any(|path| {
        path.parent() == config_path.parent()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(config_name))
    })
}

/// Start watching `config_path` for changes.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(signal_sender, config_path, debug_enabled).start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn matches_config_file_and_editor_temp_files() {
        let config = Path::new("/home/u/.config/houselights/houselights.toml");

        assert!(event_affects_config(
            &event(
                EventKind::Modify(ModifyKind::Any),
                "/home/u/.config/houselights/houselights.toml"
            ),
            config
        ));
        assert!(event_affects_config(
            &event(
                EventKind::Create(CreateKind::File),
                "/home/u/.config/houselights/houselights.toml~"
            ),
            config
        ));
    }

    const CONFIG: &str = "/home/u/.config/houselights/houselights.toml";

    #[test]
    fn burst_of_writes_yields_one_change() {
        let (tx, rx) = std::sync::mpsc::channel();
        for _ in 0..3 {
            tx.send(event(EventKind::Modify(ModifyKind::Any), CONFIG)).unwrap();
        }

        let started = Instant::now();
        assert!(next_settled_change(&rx, Path::new(CONFIG), Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
        // All three writes were consumed by the one change
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn late_write_extends_the_wait() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(event(EventKind::Create(CreateKind::File), CONFIG)).unwrap();

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send(event(EventKind::Modify(ModifyKind::Any), CONFIG)).unwrap();
            thread::sleep(Duration::from_millis(500));
        });

        let started = Instant::now();
        assert!(next_settled_change(&rx, Path::new(CONFIG), Duration::from_millis(200)));
        assert!(started.elapsed() >= Duration::from_millis(220));
        writer.join().unwrap();
    }

    #[test]
    fn unrelated_events_alone_never_settle() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(event(EventKind::Modify(ModifyKind::Any), "/home/u/.config/houselights/notes.txt"))
            .unwrap();
        drop(tx);

        assert!(!next_settled_change(&rx, Path::new(CONFIG), Duration::from_millis(10)));
    }

    #[test]
    fn ignores_unrelated_files() {
        let config = Path::new("/home/u/.config/houselights/houselights.toml");

        assert!(!event_affects_config(
            &event(
                EventKind::Modify(ModifyKind::Any),
                "/home/u/.config/houselights/notes.txt"
            ),
            config
        ));
        assert!(!event_affects_config(
            &event(
                EventKind::Modify(ModifyKind::Any),
                "/tmp/houselights.toml"
            ),
            config
        ));
    }
}
