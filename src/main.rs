//! Binary entry point: parses arguments and dispatches to the daemon or a command.

use anyhow::Result;

use houselights::Houselights;
use houselights::args::{self, CliAction, ParsedArgs};
use houselights::commands;
use houselights::common::constants::EXIT_FAILURE;
use houselights::common::logger::Log;
use houselights::config;
use houselights::{log_error_exit, log_indented, log_pipe, log_warning};

fn main() {
    if let Err(e) = run() {
        log_error_exit!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn run() -> Result<()> {
    let parsed = ParsedArgs::from_env();

    match parsed.action {
        CliAction::Run {
            debug_enabled,
            config_dir,
            dry_run,
            log_file,
        } => {
            if let Some(dir) = config_dir {
                config::set_config_dir(Some(dir))?;
            }
            let log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };
            if let Err(e) = Houselights::new(debug_enabled).dry_run(dry_run).run() {
                log_error_exit!("{:#}", e);
                // Flush the log file before exiting
                drop(log_guard);
                std::process::exit(EXIT_FAILURE);
            }
            Ok(())
        }
        CliAction::Reload {
            debug_enabled,
            config_dir,
        } => {
            if let Some(dir) = config_dir {
                config::set_config_dir(Some(dir))?;
            }
            commands::reload::handle_reload_command(debug_enabled)
        }
        CliAction::Stop { debug_enabled } => commands::stop::handle_stop_command(debug_enabled),
        CliAction::Help { topic } => commands::help::run_help_command(topic.as_deref()),
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            log_pipe!();
            log_warning!("Unknown or incomplete arguments");
            log_indented!("See the usage below");
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
    }
}
