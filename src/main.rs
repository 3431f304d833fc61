use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod api;
mod backend;
mod commands;
mod models;

use api::ApiClient;
use backend::FavoritesStore;
use commands::{FavoritesCommand, KeyCommand};

#[derive(Parser)]
#[command(name = "mealpick")]
#[command(version)]
#[command(about = "Browse TheMealDB and keep a list of favorite meals", long_about = None)]
struct Cli {
    /// TheMealDB API key (falls back to the saved key file, then the dev key)
    #[arg(long, global = true)]
    key: Option<String>,

    /// API version to use with an explicit --key (1 or 2)
    #[arg(long, global = true, default_value = "1")]
    api_version: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search meals by name
    Search {
        /// Full or partial meal name
        name: String,
    },

    /// Fetch one random meal
    Random,

    /// List meal categories
    Categories,

    /// List meals in a category
    Category {
        /// Category name (case-insensitive)
        name: String,
    },

    /// List meals by primary ingredient
    Ingredient {
        /// Ingredient name
        name: String,
    },

    /// Show a meal's full recipe by id
    Show {
        /// Meal id
        id: String,
    },

    /// Manage favorite meals
    Favorites(FavoritesCommand),

    /// Manage the saved API credential
    Key(KeyCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let api = build_client(&cli)?;
    let mut store = FavoritesStore::new(api)?;

    match &cli.command {
        Commands::Search { name } => commands::query::search(&store, name),
        Commands::Random => commands::query::random(&store),
        Commands::Categories => commands::query::categories(&store),
        Commands::Category { name } => commands::query::category(&store, name),
        Commands::Ingredient { name } => commands::query::ingredient(&store, name),
        Commands::Show { id } => commands::query::show(&store, id),
        Commands::Favorites(cmd) => cmd.run(&mut store),
        Commands::Key(cmd) => cmd.run(&store),
    }
}

/// Credential resolution: explicit flag, then the saved key file, then the
/// development key. A corrupt key file falls back to the development key
/// after reporting the problem.
fn build_client(cli: &Cli) -> Result<ApiClient, Box<dyn std::error::Error>> {
    if let Some(key) = &cli.key {
        return Ok(ApiClient::new(key, &cli.api_version)?);
    }

    let key_path = ApiClient::default_key_path();
    if key_path.exists() {
        match ApiClient::load(&key_path) {
            Ok(api) => return Ok(api),
            Err(e) => {
                eprintln!("Ignoring saved credential: {}", e);
            }
        }
    }

    tracing::warn!("no API key configured, using the development key");
    Ok(ApiClient::new(api::DEV_KEY, &cli.api_version)?)
}
