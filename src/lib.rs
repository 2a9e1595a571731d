pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::SqliteStore;
pub use app::{router, serve, AppState};
pub use config::TomlConfig;
pub use utils::error::{AppError, Result};
