use crate::config::toml_config::TomlConfig;
use crate::domain::model::ADMIN_GROUP;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "order-desk")]
#[command(about = "Order management for staff and customers")]
pub struct CliConfig {
    /// TOML config file; defaults apply when omitted
    #[arg(long, short, env = "ORDER_DESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides server.bind
    #[arg(long, env = "ORDER_DESK_BIND")]
    pub bind: Option<String>,

    /// Overrides database.url
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run migrations, apply seed data and serve HTTP
    Serve,
    /// Run migrations and exit
    Migrate,
    /// Create a login and add it to a group
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = ADMIN_GROUP)]
        group: String,
    },
}

impl CliConfig {
    /// Loads the file config (or defaults) and applies command line overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading config from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }

        Ok(config)
    }
}
