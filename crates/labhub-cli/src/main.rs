mod cli;
mod commands;
mod context;
mod logging;
mod output;

use anyhow::{Context, Result, bail};
use clap::Parser;
use labhub_config::load_config_with_default_path;

use cli::{Cli, Commands, CompendiumCommands};
use context::Storage;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    run_cli(Cli::parse()).await
}

async fn run_cli(cli: Cli) -> Result<()> {
    // Listing a local directory needs neither hub nor storage settings.
    if let Commands::List(args) = &cli.command {
        logging::init_tracing(logging::DEFAULT_LEVEL);
        return commands::files::list(&args.directory).await;
    }

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        bail!("Configuration file not found: {}", path.display());
    }
    let config =
        load_config_with_default_path(cli.config.as_ref()).context("Failed to load configuration")?;
    logging::init_tracing(&config.logging.level);

    match &cli.command {
        // Handled above.
        Commands::List(_) => {}
        Commands::Decrypt(args) => {
            let decryptor = context::decryptor(&config).await?;
            commands::files::decrypt(&decryptor, &args.input, args.output.as_deref()).await?;
        }
        Commands::Token(args) => {
            commands::hub::token(&config, args.show).await?;
        }
        Commands::Transmit(args) => {
            let gateway = context::gateway(&config)?;
            let storage = Storage::open(&config).await?;
            commands::hub::transmit(&config, gateway, storage.questions.clone(), args).await?;
        }
        Commands::Requisition(args) => {
            let gateway = context::gateway(&config)?;
            let storage = Storage::open(&config).await?;
            commands::hub::requisition(&config, gateway, storage.questions.clone(), args).await?;
        }
        Commands::Results => {
            let gateway = context::gateway(&config)?;
            commands::hub::results(gateway).await?;
        }
        Commands::Compendium(args) => match &args.command {
            CompendiumCommands::List => {
                let gateway = context::gateway(&config)?;
                commands::compendium::list(&config, gateway).await?;
            }
            CompendiumCommands::Sync => {
                let gateway = context::gateway(&config)?;
                let storage = Storage::open(&config).await?;
                commands::compendium::sync(&config, gateway, &storage).await?;
            }
            CompendiumCommands::Import(import) => {
                let storage = Storage::open(&config).await?;
                commands::compendium::import(&config, &storage, &import.directory).await?;
            }
        },
        Commands::Service(args) => {
            let storage = Storage::open(&config).await?;
            commands::service::run(&storage, &args.command).await?;
        }
    }

    Ok(())
}
