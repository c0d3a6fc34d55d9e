//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// BGmi admin gateway - token-guarded admin API and UI
#[derive(Parser, Debug)]
#[command(name = "bgmi-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "BGMI_ADMIN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "BGMI_ADMIN_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "BGMI_ADMIN_HOST")]
    pub host: Option<String>,

    /// Development mode (serve the admin UI from disk, enable CORS)
    #[arg(long)]
    pub dev: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "BGMI_ADMIN_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "BGMI_ADMIN_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the admin gateway (default)
    Serve,

    /// Print a freshly generated admin token
    GenToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["bgmi-admin"]);
        assert!(cli.command.is_none());
        assert!(!cli.dev);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_overrides_and_subcommand() {
        let cli = Cli::parse_from([
            "bgmi-admin",
            "--port",
            "9000",
            "--host",
            "0.0.0.0",
            "--dev",
            "gen-token",
        ]);
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert!(cli.dev);
        assert!(matches!(cli.command, Some(Command::GenToken)));
    }
}
