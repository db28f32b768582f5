//! Ares backend CLI
//!
//! Runs the HTTP server or administers accounts directly against the
//! configured providers, using the service credentials rather than an
//! admin login.
//!
//! ```sh
//! # Run with default config (~/.config/ares-backend/config.toml)
//! ares-cli serve
//!
//! # Validate config without starting
//! ares-cli serve --check
//!
//! # Every account, newest first, with a summary
//! ares-cli users list
//!
//! # Grant or revoke the admin claim
//! ares-cli users set-admin --email ada@example.com --value false
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use ares_backend::application::AppServices;
use ares_backend::config::AppConfig;
use ares_backend::domain::Account;
use ares_backend::server::{init_tracing, ServerHandle, ServerOptions};
use ares_backend::{build_providers, config_path_from_env};

#[derive(Parser, Debug)]
#[command(
    name = "ares-cli",
    version,
    about = "Ares backend server and account administration",
    long_about = "Ares backend: accounts and player profiles over Firebase.\n\n\
                  Default config: ~/.config/ares-backend/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ARES_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Override the listen port.
        #[arg(long)]
        port: Option<u16>,

        /// Validate the configuration and exit without starting the server.
        #[arg(long)]
        check: bool,

        /// Skip creating the configured seed admin.
        #[arg(long)]
        no_seed: bool,
    },
    /// Account administration.
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List every account, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Set or clear the admin claim on an account.
    SetAdmin {
        #[arg(long)]
        email: String,

        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        value: bool,
    },
}

/// Counts printed after `users list`.
#[derive(Debug, Default, PartialEq, Eq)]
struct ListingSummary {
    total: usize,
    verified: usize,
    unverified: usize,
    disabled: usize,
}

impl ListingSummary {
    fn of(accounts: &[Account]) -> Self {
        let verified = accounts.iter().filter(|a| a.email_verified).count();
        Self {
            total: accounts.len(),
            verified,
            unverified: accounts.len() - verified,
            disabled: accounts.iter().filter(|a| a.disabled).count(),
        }
    }
}

fn load_config(cli: &Cli) -> AppConfig {
    let config_path = cli.config.clone().unwrap_or_else(config_path_from_env);

    let (mut config, load_error) = match AppConfig::load_with_env(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    config
}

fn services(config: &AppConfig) -> Result<AppServices, Box<dyn std::error::Error>> {
    let providers = build_providers(config)?;
    Ok(AppServices::new(&providers, config.admin_auth.mode))
}

async fn serve(
    mut config: AppConfig,
    port: Option<u16>,
    check: bool,
    no_seed: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    let problems = config.validate();
    if check {
        if problems.is_empty() {
            println!("Configuration is valid");
        } else {
            println!("Configuration has {} problem(s):", problems.len());
            for problem in &problems {
                println!("   - {}", problem);
            }
        }
        println!("   Address    : {}", config.server.address());
        println!("   Base URL   : {}", config.server.public_url());
        println!("   Provider   : {}", config.provider.backend);
        println!("   Admin auth : {:?}", config.admin_auth.mode);
        println!("   Log level  : {}", config.logging.level);
        if problems.is_empty() {
            return Ok(());
        }
        return Err("invalid configuration".into());
    }
    for problem in &problems {
        warn!("Config: {}", problem);
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        seed_admin: !no_seed,
    })
    .await?;
    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.wait().await;
    Ok(())
}

async fn list_users(config: &AppConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let accounts = services(config)?.admin.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
    } else {
        for account in &accounts {
            println!(
                "{:<30} {:<36} {:<20} {}{}{}",
                account.uid,
                account.email.as_deref().unwrap_or("-"),
                account.display_name.as_deref().unwrap_or("-"),
                if account.email_verified { "verified" } else { "unverified" },
                if account.disabled { " disabled" } else { "" },
                if account.is_admin() { " admin" } else { "" },
            );
        }
    }

    let summary = ListingSummary::of(&accounts);
    println!();
    println!("Total      : {}", summary.total);
    println!("Verified   : {}", summary.verified);
    println!("Unverified : {}", summary.unverified);
    println!("Disabled   : {}", summary.disabled);
    Ok(())
}

async fn set_admin(
    config: &AppConfig,
    email: &str,
    value: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let account = services(config)?.admin.set_admin_claim(email, value).await?;
    println!(
        "{} ({}) admin = {}",
        email,
        account.uid,
        account.is_admin()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        Command::Serve {
            port,
            check,
            no_seed,
        } => serve(config, port, check, no_seed).await,
        Command::Users { command } => match command {
            UsersCommand::List { json } => list_users(&config, json).await,
            UsersCommand::SetAdmin { email, value } => set_admin(&config, &email, value).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ares_backend::domain::AccountMetadata;
    use clap::CommandFactory;

    fn account(verified: bool, disabled: bool) -> Account {
        Account {
            uid: "u".into(),
            email: None,
            email_verified: verified,
            display_name: None,
            disabled,
            metadata: AccountMetadata::default(),
            custom_claims: Default::default(),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_admin_value_defaults_to_true() {
        let cli = Cli::parse_from(["ares-cli", "users", "set-admin", "--email", "a@example.com"]);
        match cli.command {
            Command::Users {
                command: UsersCommand::SetAdmin { value, .. },
            } => assert!(value),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from([
            "ares-cli", "users", "set-admin", "--email", "a@example.com", "--value", "false",
        ]);
        assert!(matches!(
            cli.command,
            Command::Users {
                command: UsersCommand::SetAdmin { value: false, .. }
            }
        ));
    }

    #[test]
    fn summary_counts_each_bucket() {
        let accounts = vec![
            account(true, false),
            account(false, false),
            account(false, true),
        ];
        assert_eq!(
            ListingSummary::of(&accounts),
            ListingSummary {
                total: 3,
                verified: 1,
                unverified: 2,
                disabled: 1,
            }
        );
    }
}
