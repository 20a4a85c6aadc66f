use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mensa_core::{Config, MealService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Parser)]
#[command(name = "mensa")]
#[command(version, about = "Meal plan feed as a JSON API", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/mensa-feed/config.toml)
    #[arg(long, global = true, env = "MENSA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Serve GET /api/mensa
    Serve {
        /// Address to listen on, overrides the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Fetch the feed once and print the meals as JSON
    Fetch {
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `fetch` output stays clean JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mensa=info,mensa_core=info,mensa_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let service = Arc::new(MealService::from_config(&config)?);
            server::serve(service, &bind).await?;
        }
        Commands::Fetch { pretty } => {
            tracing::info!("Fetching meal plan once");
            let service = MealService::from_config(&config)?;
            let meals = service.meals().await?;
            let json = if pretty {
                serde_json::to_string_pretty(&*meals)?
            } else {
                serde_json::to_string(&*meals)?
            };
            println!("{}", json);
        }
    }

    Ok(())
}
