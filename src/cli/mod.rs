// CLI interface
pub mod commands;

use crate::auth::{FileStore, HttpAuthApi};
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionManager;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "jornada")]
#[command(about = "Production shift tracking: activity times and backend sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL
    #[arg(long, global = true, env = "JORNADA_API_URL")]
    pub api_url: Option<String>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the time of an activity from its start and end clock times
    Tiempo {
        /// Start time (HH:MM, 24h)
        inicio: String,

        /// End time (HH:MM, 24h); earlier than the start means the next day
        fin: String,

        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },

    /// Recompute activity times and totals for a shift file (JSON)
    Jornada {
        /// Path to the shift JSON file
        file: PathBuf,

        /// Write the recomputed times back to the file
        #[arg(short, long)]
        write: bool,

        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },

    /// Log in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "JORNADA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Start an operator session by validating a cédula
    Cedula {
        /// Operator's identity number
        cedula: String,
    },

    /// Check session status
    Status {
        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },

    /// Renew the access token if it has expired
    Refresh {
        /// Renew even if the current token is still valid
        #[arg(short, long)]
        force: bool,
    },

    /// Log out and clear the stored session
    Logout,

    /// Watch the session, warning before expiry and renewing automatically
    Watch,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    ///
    /// Bash: eval "$(jornada completions bash)"
    /// Zsh:  eval "$(jornada completions zsh)"
    /// Fish: jornada completions fish > ~/.config/fish/completions/jornada.fish
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Create a sample config file
    Init,
    /// Show the config file location and whether it is valid
    Path,
}

#[derive(Debug, Clone, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Commands {
    /// Long-running commands log to a file instead of stderr
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Watch)
    }
}

/// Load config and build a session manager against the configured backend
pub fn open_session(api_url: Option<String>) -> Result<(Config, Arc<SessionManager>)> {
    let mut config = Config::load()?;
    if api_url.is_some() {
        config.api.base_url = api_url;
    }

    let base_url = config.base_url()?.to_string();
    let store = FileStore::for_api(&base_url)?;
    tracing::debug!("Session file: {}", store.path().display());

    let api = HttpAuthApi::new(&base_url, config.request_timeout())?;
    let session = SessionManager::new(Arc::new(store), Arc::new(api));

    Ok((config, Arc::new(session)))
}

pub async fn execute(args: Cli) -> Result<()> {
    match args.command {
        Commands::Tiempo { inicio, fin, json } => commands::tiempo::execute(&inicio, &fin, json),
        Commands::Jornada { file, write, json } => commands::jornada::execute(&file, write, json),
        Commands::Login { email, password } => {
            commands::login::execute(args.api_url, &email, &password).await
        }
        Commands::Cedula { cedula } => commands::cedula::execute(args.api_url, &cedula).await,
        Commands::Status { json } => commands::status::execute(args.api_url, json).await,
        Commands::Refresh { force } => commands::refresh::execute(args.api_url, force).await,
        Commands::Logout => commands::logout::execute(args.api_url).await,
        Commands::Watch => commands::watch::execute(args.api_url).await,
        Commands::Config(command) => commands::config::execute(command),
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
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
    }

    #[test]
    fn test_parse_tiempo() {
        let cli = Cli::try_parse_from(["jornada", "tiempo", "23:30", "00:15", "--json"]).unwrap();
        match cli.command {
            Commands::Tiempo { inicio, fin, json } => {
                assert_eq!(inicio, "23:30");
                assert_eq!(fin, "00:15");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_api_url_after_subcommand() {
        let cli =
            Cli::try_parse_from(["jornada", "status", "--api-url", "http://localhost:5000/api"])
                .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:5000/api"));
        assert!(!cli.command.is_long_running());
    }
}
