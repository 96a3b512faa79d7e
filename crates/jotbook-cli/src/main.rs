//! jot - jotbook CLI

mod cli;
mod commands;
mod config_profiles;
mod error;
mod storage;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::AppContext;
use crate::commands::edit::EditArgs;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        if error.is_auth() {
            eprintln!("Run `jot auth login --email <email>` to sign in.");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jot=info,jotbook_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    let context = || AppContext::load(profile);

    match cli.command {
        Commands::Auth { command } => commands::auth_cmd::run_auth(command, profile).await?,
        Commands::Config { command } => commands::config::run_config(command, profile)?,
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
        Commands::List { filter, json } => {
            commands::list::run_list(&context()?, filter.as_deref(), json).await?;
        }
        Commands::Search {
            query,
            remote,
            json,
        } => commands::search::run_search(&context()?, &query, remote, json).await?,
        Commands::Show { id, json } => commands::show::run_show(&context()?, &id, json).await?,
        Commands::Add {
            title,
            tags,
            images,
            content,
        } => commands::add::run_add(&context()?, &title, &content, &tags, &images).await?,
        Commands::Edit {
            id,
            title,
            content,
            tags,
            clear_tags,
            remove_images,
            add_image,
        } => {
            let args = EditArgs {
                title,
                content,
                tags,
                clear_tags,
                remove_images,
                add_image,
            };
            commands::edit::run_edit(&context()?, &id, args).await?;
        }
        Commands::Delete { id } => commands::delete::run_delete(&context()?, &id).await?,
        Commands::Images { command } => {
            commands::images::run_images(&context()?, command).await?;
        }
        Commands::Export {
            format,
            filter,
            output,
        } => {
            commands::export::run_export(
                &context()?,
                format,
                filter.as_deref(),
                output.as_deref(),
            )
            .await?;
        }
        Commands::Pdf { id, output } => {
            commands::pdf::run_pdf(&context()?, &id, output.as_deref()).await?;
        }
        Commands::Theme { command } => commands::theme::run_theme(&context()?, command)?,
    }

    Ok(())
}
