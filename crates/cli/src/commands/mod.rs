//! CLI subcommands and the setup they share.

pub mod ask;
pub mod config_cmd;
pub mod schema;
pub mod suggest;

use std::sync::Arc;

use querysmith_config::AppConfig;
use querysmith_core::database::Database;
use querysmith_core::provider::Provider;
use querysmith_core::schema::SchemaTable;
use querysmith_database::PostgresDatabase;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

pub(crate) fn load_config() -> CliResult<AppConfig> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The configured completion provider, with its call timeout applied.
pub(crate) fn provider(config: &AppConfig) -> CliResult<Arc<dyn Provider>> {
    // Fail early with setup instructions when no key is set
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!("    QUERYSMITH_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = querysmith_providers::router::build_from_config(config);
    Ok(router.default().ok_or("No default provider configured")?)
}

pub(crate) async fn connect(config: &AppConfig) -> CliResult<Arc<PostgresDatabase>> {
    let db = querysmith_database::connect_from_config(&config.database).await?;
    Ok(Arc::new(db))
}

/// Introspect the database and join the synonym table when one is configured.
pub(crate) async fn load_schema(config: &AppConfig, db: &dyn Database) -> CliResult<SchemaTable> {
    let schema = querysmith_database::load_schema(db).await?;
    let schema = querysmith_database::enrich_if_available(schema, config.synonyms.path.as_deref())?;
    Ok(schema)
}
