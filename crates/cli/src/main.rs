//! QuerySmith CLI: the main entry point.
//!
//! Commands:
//! - `ask`: Answer a question against the configured database
//! - `schema`: Print the schema table the pipeline works from
//! - `suggest`: Suggest questions worth asking
//! - `config`: Show, locate, or validate the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "querysmith",
    about = "QuerySmith: ask a PostgreSQL database questions in plain English",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question (prompts for one when omitted)
    Ask {
        question: Option<String>,

        /// Write every pipeline checkpoint to this file as JSON
        #[arg(long)]
        trace: Option<PathBuf>,
    },

    /// Print the schema table, with synonyms when configured
    Schema,

    /// Suggest questions based on sampled data
    Suggest {
        /// How many questions to ask for
        #[arg(short, long, default_value_t = 20)]
        count: usize,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets included, handle with care)
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration and report problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Only the answer goes to stdout; logs go to stderr
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask { question, trace } => commands::ask::run(question, trace).await?,
        Commands::Schema => commands::schema::run().await?,
        Commands::Suggest { count } => commands::suggest::run(count).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
