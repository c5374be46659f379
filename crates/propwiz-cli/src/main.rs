//! Propwiz CLI Application
//!
//! Command-line driver for the property listing wizard.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands, SessionCommands};
use clap::Parser;
use cli::{Cli, SessionCli};
use log::info;
use propwiz_core::{SessionStore, WizardBuilder};
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        api_url,
        api_token,
        session_file,
        no_color,
        command,
    } = Args::parse();

    let renderer = TerminalRenderer::new(!no_color);

    info!("Propwiz started");

    let builder = WizardBuilder::new()
        .with_api_base_url(api_url)
        .with_api_token(api_token)
        .with_session_path(session_file.as_ref());

    match command.unwrap_or(Commands::Status) {
        Commands::Demo => cli::run_demo(&renderer).await,
        Commands::Session { command } => match command {
            SessionCommands::Resume { draft_id } => {
                let wizard = builder
                    .resume(cli::parse_draft_id(&draft_id)?)
                    .build()
                    .await
                    .context("Failed to initialize wizard")?;
                Cli::new(wizard, renderer)
                    .handle_command(Commands::Status)
                    .await
            }
            other => {
                let path = match session_file {
                    Some(path) => path,
                    None => SessionStore::default_path()?,
                };
                let store = SessionStore::open(path)
                    .await
                    .context("Failed to open session database")?;
                let session = SessionCli::new(store, renderer);
                if let SessionCommands::Show = other {
                    session.show().await
                } else {
                    session.clear().await
                }
            }
        },
        command => {
            let wizard = builder
                .build()
                .await
                .context("Failed to initialize wizard")?;
            Cli::new(wizard, renderer).handle_command(command).await
        }
    }
}
