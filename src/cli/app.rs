use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kc-account")]
#[command(about = "Manage Keycloak accounts declaratively")]
#[command(version)]
pub struct Cli {
    /// Provider config file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "KC_ACCOUNT_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file
    #[arg(short, long, global = true, default_value = "kc-account.state.json")]
    pub state: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the changes applying a manifest would make
    Plan {
        /// Resource manifest (TOML)
        manifest: PathBuf,
    },
    /// Create, update, replace or delete resources to match a manifest
    Apply {
        /// Resource manifest (TOML)
        manifest: PathBuf,
    },
    /// Re-read every resource in state from Keycloak
    Refresh,
    /// Delete every resource in state
    Destroy,
    /// Bring an existing account under management
    Import {
        /// Address to import into, e.g. keycloak_account.acme
        address: String,
        /// Import id, `{realm_id}/{account_id}`
        id: String,
    },
    /// Print the current state
    Show,
    /// Print the schema of every resource type
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
