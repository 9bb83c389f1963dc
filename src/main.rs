//! # Relay Chat
//!
//! Terminal chat client for an AI assistant hosted behind relay webhooks.
//!
//! ## Features
//! - Interactive terminal UI (TUI) with categories, saved conversations, and themes
//! - Single prompt mode with `-p` or `--prompt`
//! - Account, plan, history, and settings commands for scripting

mod cli;
mod core;
mod run;
mod tui;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;

use crate::cli::{Args, Commands, HistorySubcommand, SettingsSubcommand};
use crate::core::cli as commands;
use crate::core::config::{self, Config};

/// Load the relay configuration or exit with a readable message.
fn require_config() -> Config {
    config::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

async fn dispatch(command: Commands) -> commands::CliResult {
    match command {
        Commands::Login { email, password } => {
            let config = require_config();
            let mut session = commands::open_session()?;
            commands::run_login(&config, &mut session, email, password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let config = require_config();
            let mut session = commands::open_session()?;
            commands::run_register(&config, &mut session, name, email, password).await
        }
        Commands::Logout => commands::run_logout(&mut commands::open_session()?),
        Commands::ResetPassword { email } => {
            commands::run_reset_password(&require_config(), &email).await
        }
        Commands::Status => {
            commands::run_status(&commands::open_session()?);
            Ok(())
        }
        Commands::Categories => {
            commands::run_categories(&commands::open_session()?);
            Ok(())
        }
        Commands::Category { id } => commands::run_category(&mut commands::open_session()?, &id),
        Commands::Plans => {
            commands::run_plans(&commands::open_session()?);
            Ok(())
        }
        Commands::Upgrade { plan, no_open } => {
            let config = require_config();
            let mut session = commands::open_session()?;
            commands::run_upgrade(&config, &mut session, &plan, no_open).await
        }
        Commands::PaymentCallback { origin, plan, data } => {
            let config = require_config();
            let data = commands::arg_or_stdin(data)?;
            let mut session = commands::open_session()?;
            commands::run_payment_callback(&config, &mut session, &origin, &plan, data.trim())
        }
        Commands::New => commands::run_new(&mut commands::open_session()?),
        Commands::History { subcommand } => {
            let mut session = commands::open_session()?;
            match subcommand {
                HistorySubcommand::List { limit, query } => {
                    commands::run_history_list(&session, limit, query.as_deref());
                    Ok(())
                }
                HistorySubcommand::Show { id } => commands::run_history_show(&session, &id),
                HistorySubcommand::Restore { id } => {
                    commands::run_history_restore(&mut session, &id)
                }
                HistorySubcommand::Delete { id } => {
                    commands::run_history_delete(&mut session, &id)
                }
                HistorySubcommand::Clear => commands::run_history_clear(&mut session),
            }
        }
        Commands::Theme { value } => {
            commands::run_theme(&mut commands::open_session()?, value.as_deref())
        }
        Commands::Settings { subcommand } => {
            let mut session = commands::open_session()?;
            match subcommand {
                SettingsSubcommand::Show => commands::run_settings_show(&session),
                SettingsSubcommand::Import { path } => {
                    commands::run_settings_import(&mut session, &path)
                }
                SettingsSubcommand::Reset => commands::run_settings_reset(&mut session),
            }
        }
        Commands::Inspect { body } => {
            commands::run_inspect(&commands::arg_or_stdin(body)?);
            Ok(())
        }
        Commands::Config => {
            commands::run_config();
            Ok(())
        }
        Commands::Completions { shell } => {
            cli::generate(
                shell,
                &mut Args::command(),
                crate::core::app::NAME,
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let mut args = Args::parse();
    run::init_logger(&args);

    if let Some(command) = args.command.take() {
        if let Err(e) = dispatch(command).await {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(prompt) = &args.prompt {
        let config = require_config();
        if let Err(e) = run::run_single_prompt(&args, &config, prompt).await {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    run::launch_tui(require_config()).await
}
