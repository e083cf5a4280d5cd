pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod validation;

pub use config::Config;

use anyhow::Context;
use db::Store;
use services::{AccountService, RegisterRequest, SeaOrmAccountService};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "-s" | "--serve" => run_server(config).await,

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "user" | "u" => {
            if args.len() < 3 {
                println!("Usage: konto user <subcommand>");
                println!("Subcommands: add, list, passwd, remove");
                return Ok(());
            }
            match args[2].as_str() {
                "add" => {
                    if args.len() < 5 {
                        println!("Usage: konto user add <username> <email>");
                        println!("The password is read from stdin.");
                        return Ok(());
                    }
                    cmd_user_add(&config, &args[3], &args[4]).await
                }
                "list" | "ls" => cmd_user_list(&config).await,
                "passwd" => {
                    if args.len() < 4 {
                        println!("Usage: konto user passwd <username>");
                        return Ok(());
                    }
                    cmd_user_passwd(&config, &args[3]).await
                }
                "remove" | "rm" => {
                    if args.len() < 4 {
                        println!("Usage: konto user remove <id>");
                        return Ok(());
                    }
                    cmd_user_remove(&config, &args[3]).await
                }
                _ => {
                    println!("Unknown user subcommand: {}", args[2]);
                    println!("Use: add, list, passwd, remove");
                    Ok(())
                }
            }
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Konto - User Account Service");
    println!("Authentication and account management over HTTP");
    println!();
    println!("USAGE:");
    println!("  konto <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  serve             Run the HTTP API server");
    println!("  user add <username> <email>");
    println!("                    Create an account (password read from stdin)");
    println!("  user list         List all accounts");
    println!("  user passwd <username>");
    println!("                    Set a new password for an account");
    println!("  user remove <id>  Soft-delete an account");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the database, server port, and");
    println!("  security parameters (Argon2 costs, reset-token expiry).");
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!(
        "Konto v{} starting HTTP server...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state(config).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API server running at http://{addr}");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server.abort();
    info!("Server stopped");

    Ok(())
}

fn account_service(config: &Config, store: Store) -> SeaOrmAccountService {
    SeaOrmAccountService::new(store, config.security.clone())
}

fn read_password_from_stdin(prompt: &str) -> anyhow::Result<String> {
    println!("{prompt}");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

async fn cmd_user_add(config: &Config, username: &str, email: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let accounts = account_service(config, store);

    let password = read_password_from_stdin("Enter password for the new account:")?;

    match accounts
        .register(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password,
            role_id: None,
            user_type_id: None,
        })
        .await
    {
        Ok(user) => {
            println!("✓ Created account: {} (ID: {})", user.username, user.id);
            Ok(())
        }
        Err(services::AccountError::Validation(errors)) => {
            println!("Validation failed:");
            for e in errors {
                println!("  - {e}");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_user_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No accounts.");
        return Ok(());
    }

    println!("Accounts ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let status_name = store.status_name(user.status_id).await?;
        let role_name = store.role_name(user.role_id).await?;

        println!("• {} <{}>", user.username, user.email);
        println!(
            "  ID: {} | Status: {} | Role: {}",
            user.id, status_name, role_name
        );
    }

    Ok(())
}

async fn cmd_user_passwd(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let user = store
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No active account named '{username}'"))?;

    let password = read_password_from_stdin("Enter new password:")?;
    if password.len() < 8 {
        println!("Password must be at least 8 characters.");
        return Ok(());
    }

    store
        .update_user_password(user.id, &password, &config.security)
        .await?;

    println!("✓ Password updated for {username}");
    Ok(())
}

async fn cmd_user_remove(config: &Config, id_str: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let id: i32 = match id_str.parse() {
        Ok(id) => id,
        Err(_) => {
            println!("Invalid account ID: {id_str}");
            println!("Use 'konto user list' to see IDs.");
            return Ok(());
        }
    };

    if store.soft_delete_user(id).await? {
        println!("✓ Account {id} marked deleted");
    } else {
        println!("Account {id} not found.");
    }

    Ok(())
}
