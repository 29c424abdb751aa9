//! Command-line interface for the `gate` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::Verbosity;

/// gate - serial-triggered ambulance gate
///
/// Raises a servo-driven gate when the detector sends 'A' over serial, and
/// provides the detector-side tools that send it.
#[derive(Debug, Parser)]
#[command(name = "gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drive the servo from bytes received on the serial port
    Listen(ListenCommand),

    /// Send a single trigger byte
    Trigger(PortArgs),

    /// Read detection frames (JSON lines) from stdin and signal sightings
    Bridge(PortArgs),

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Debug, Args)]
pub struct PortArgs {
    /// Serial port, overriding the configured one
    #[arg(short, long)]
    pub port: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListenCommand {
    #[command(flatten)]
    pub port: PortArgs,

    /// Log servo commands instead of driving PWM hardware
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), "gate");
    }

    #[test]
    fn test_parse_listen() {
        let cli = Cli::parse_from(["gate", "listen", "--port", "/dev/ttyACM0", "--dry-run"]);
        match cli.command {
            Command::Listen(cmd) => {
                assert_eq!(cmd.port.port.as_deref(), Some("/dev/ttyACM0"));
                assert!(cmd.dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_trigger_with_config() {
        let cli = Cli::parse_from(["gate", "-c", "gate.toml", "trigger"]);
        assert_eq!(cli.config, Some(PathBuf::from("gate.toml")));
        assert!(matches!(cli.command, Command::Trigger(PortArgs { port: None })));
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(Cli::parse_from(["gate", "config"]).verbosity(), Verbosity::Normal);
        assert_eq!(Cli::parse_from(["gate", "-v", "config"]).verbosity(), Verbosity::Verbose);
        assert_eq!(Cli::parse_from(["gate", "-vv", "config"]).verbosity(), Verbosity::Trace);
        assert_eq!(Cli::parse_from(["gate", "-q", "-v", "config"]).verbosity(), Verbosity::Quiet);
    }
}
