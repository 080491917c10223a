use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gameshelf::app::AppContext;
use gameshelf::cli::{commands, Cli, Commands};
use gameshelf::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.manifest_url {
        config.catalog.manifest_url = url;
    }
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Fetch { url } => {
            commands::fetch_url(&ctx, &url).await?;
        }
        Commands::List { json } => {
            commands::list_entries(&ctx, json).await?;
        }
        Commands::Watch {
            interval,
            no_initial_refresh,
        } => {
            commands::watch(&ctx, interval.as_deref(), no_initial_refresh).await?;
        }
    }

    Ok(())
}
