pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod presentation;
pub mod repository;
pub mod services;
pub mod session;
pub mod state;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{AddEntryArgs, Cli, CollectionCommands, Commands};
pub use config::Config;
use state::AppContext;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("Config file already exists.");
        }
        return Ok(());
    }

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Ignoring unreadable .env file: {e}");
    }

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    info!(backend = ?config.backend.kind, "Starting animeshelf");
    let ctx = AppContext::new(config).await?;

    let result = dispatch(&ctx, command).await;
    if let Err(e) = &result {
        warn!(error = %e, "Command failed");
    }

    ctx.shutdown();
    result
}

async fn dispatch(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => Ok(()),

        Commands::Login {
            email,
            password,
            provider,
        } => cli::cmd_login(ctx, email, password, provider).await,

        Commands::Register {
            email,
            name,
            password,
        } => cli::cmd_register(ctx, email, name, password).await,

        Commands::Logout => cli::cmd_logout(ctx).await,

        Commands::Whoami => {
            cli::cmd_whoami(ctx);
            Ok(())
        }

        Commands::Search { query } => cli::cmd_search(ctx, &query.join(" ")).await,

        Commands::Seasonal { limit } => cli::cmd_seasonal(ctx, limit).await,

        Commands::Show { mal_id } => cli::cmd_show(ctx, mal_id).await,

        Commands::Collections { command } => match command {
            CollectionCommands::List => cli::cmd_collection_list(ctx).await,
            CollectionCommands::Create {
                name,
                description,
                images,
            } => cli::cmd_collection_create(ctx, name, description, images).await,
            CollectionCommands::Edit {
                id,
                name,
                description,
                images,
                clear_images,
            } => cli::cmd_collection_edit(ctx, &id, name, description, images, clear_images).await,
            CollectionCommands::Delete { id } => cli::cmd_collection_delete(ctx, &id).await,
        },

        Commands::Entries {
            collection_id,
            filter,
        } => cli::cmd_entries(ctx, &collection_id, filter).await,

        Commands::Add {
            mal_id,
            collection,
            status,
            score,
            progress,
            started,
            finished,
            notes,
        } => {
            let args = AddEntryArgs {
                mal_id,
                collection,
                status,
                score,
                progress,
                started,
                finished,
                notes,
            };
            cli::cmd_add_entry(ctx, args).await
        }
    }
}
