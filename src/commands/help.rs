//! Help command implementation.

use anyhow::Result;

/// Run the help command. `None` shows the command overview.
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("reload") | Some("r") => super::reload::display_help(),
        Some("stop") | Some("s") => super::stop::display_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_version!();
            log_pipe!();
            log_warning!("Unknown command: {}", unknown);
            display_command_list();
            log_end!();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    display_command_list();
    log_pipe!();
    log_info!("Use 'houselights help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'houselights --help' to see all options and general usage.");
    log_end!();
}

fn display_command_list() {
    log_block_start!("Available Commands:");
    log_indented!("help [COMMAND]   Show detailed help for a command");
    log_indented!("reload, r        Reload configuration of the running instance");
    log_indented!("stop, s          Turn the lights off and stop the running instance");
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Show help for houselights commands");
    log_block_start!("Usage: houselights help [COMMAND]");
    log_end!();
}
