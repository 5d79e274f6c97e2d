//! Small helpers shared across modules.

use std::path::Path;

/// Replace the home directory prefix with `~` for log output.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Whether a process with this PID currently exists.
pub fn is_process_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

/// Format a seconds value the way the config file writes it: integers without decimals.
pub fn format_seconds(seconds: f64) -> String {
    let value = if seconds.fract() == 0.0 {
        format!("{}", seconds as u64)
    } else {
        format!("{seconds:.1}")
    };
    let unit = if seconds == 1.0 { "second" } else { "seconds" };
    format!("{value} {unit}")
}
