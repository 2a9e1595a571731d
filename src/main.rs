use std::sync::Arc;

use clap::Parser;
use order_desk::core::{accounts, seed};
use order_desk::domain::ports::{ConfigProvider, Store};
use order_desk::utils::error::{AppError, ErrorSeverity};
use order_desk::utils::{logger, validation::Validate};
use order_desk::{AppState, CliConfig, Command, SqliteStore, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting order-desk");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    if let Err(e) = run(cli.command, config).await {
        exit_with(e);
    }

    Ok(())
}

async fn run(command: Command, config: TomlConfig) -> order_desk::Result<()> {
    let store = SqliteStore::connect(config.database_url(), config.max_connections()).await?;
    store.migrate().await?;

    match command {
        Command::Migrate => {
            println!("Migrations applied to {}", config.database_url());
        }
        Command::CreateUser {
            username,
            password,
            email,
            group,
        } => {
            let user = accounts::create_account(&store, &username, &password, email, &group).await?;
            println!("Created user '{}' in group '{}'", user.username, group);
        }
        Command::Serve => {
            seed::apply(&store, &config.seed).await?;

            let store: Arc<dyn Store> = Arc::new(store);
            let state = AppState::new(store, &config)?;
            order_desk::serve(state, config.bind_address()).await?;
        }
    }

    Ok(())
}

fn exit_with(e: AppError) -> ! {
    tracing::error!(
        "Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
