//! Command-line argument parsing and processing.
//!
//! Flags may appear before or after the subcommand. Anything unrecognised sends the
//! user to the help text.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        dry_run: bool,
        log_file: Option<String>,
    },
    /// Ask the running instance to reload its configuration
    Reload {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Stop the running instance
    Stop { debug_enabled: bool },
    /// Help for a specific command, or the command overview
    Help { topic: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

#[derive(Debug, PartialEq)]
enum Command {
    Reload,
    Stop,
    Help,
}

impl ParsedArgs {
    /// Parse command-line arguments (including the program name) into an action.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut dry_run = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut command: Option<Command> = None;
        let mut help_topic: Option<String> = None;
        let mut unknown_arg_found = false;

        let mut args = args.into_iter().skip(1).map(|s| s.as_ref().to_string());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--dry-run" | "-n" => dry_run = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--config" | "-c" => match args.next() {
                    Some(dir) => config_dir = Some(dir),
                    None => unknown_arg_found = true,
                },
                "--log" | "-l" => match args.next() {
                    Some(file) => log_file = Some(file),
                    None => unknown_arg_found = true,
                },
                flag if flag.starts_with('-') => unknown_arg_found = true,
                word => match (&command, word) {
                    (None, "reload" | "r") => command = Some(Command::Reload),
                    (None, "stop" | "s") => command = Some(Command::Stop),
                    (None, "help") => command = Some(Command::Help),
                    (Some(Command::Help), topic) if help_topic.is_none() => {
                        help_topic = Some(topic.to_string())
                    }
                    _ => unknown_arg_found = true,
                },
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            match command {
                Some(Command::Reload) => CliAction::Reload {
                    debug_enabled,
                    config_dir,
                },
                Some(Command::Stop) => CliAction::Stop { debug_enabled },
                Some(Command::Help) => CliAction::Help { topic: help_topic },
                None => CliAction::Run {
                    debug_enabled,
                    config_dir,
                    dry_run,
                    log_file,
                },
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("houselights [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-n, --dry-run          Log controller commands instead of opening the port");
    log_indented!("-l, --log <file>       Write the log to a file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("reload, r              Reload configuration of the running instance");
    log_indented!("stop, s                Turn the lights off and stop the running instance");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        ParsedArgs::parse(std::iter::once("houselights").chain(args.iter().copied())).action
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                dry_run: false,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_run_flags() {
        assert_eq!(
            parse(&["-d", "--dry-run", "--config", "/tmp/hl", "--log", "/tmp/hl.log"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/hl".to_string()),
                dry_run: true,
                log_file: Some("/tmp/hl.log".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-h"]), CliAction::ShowHelp);
        assert_eq!(parse(&["--version"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        // Version wins over help
        assert_eq!(parse(&["--help", "-v"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_subcommands() {
        assert_eq!(
            parse(&["reload", "--debug"]),
            CliAction::Reload {
                debug_enabled: true,
                config_dir: None,
            }
        );
        assert_eq!(
            parse(&["-c", "/etc/hl", "r"]),
            CliAction::Reload {
                debug_enabled: false,
                config_dir: Some("/etc/hl".to_string()),
            }
        );
        assert_eq!(parse(&["stop"]), CliAction::Stop { debug_enabled: false });
        assert_eq!(parse(&["help"]), CliAction::Help { topic: None });
        assert_eq!(
            parse(&["help", "reload"]),
            CliAction::Help {
                topic: Some("reload".to_string())
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(&["--unknown"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--config"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["dance"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["reload", "stop"]), CliAction::ShowHelpDueToError);
    }
}
