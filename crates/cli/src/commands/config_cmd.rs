//! `querysmith config`: Configuration management commands.

use querysmith_config::AppConfig;

use super::CliResult;

pub async fn validate() -> CliResult<()> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ok  Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ok  All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   !!  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Model:     {}", config.default_model);
            println!(
                "   Budget:    {} tokens ({} reserved for answers)",
                config.budget.total_tokens, config.budget.reserved_answer_tokens
            );
            println!("   Repairs:   {}", config.repair.max_retries);
            println!(
                "   Synonyms:  {}",
                config
                    .synonyms
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".into())
            );
        }
        Err(e) => {
            println!("   ERR Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Problems that do not stop loading but will stop a run.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if !config.has_api_key() {
        warnings.push("No API key set (set OPENAI_API_KEY or QUERYSMITH_API_KEY)");
    }

    if config.database.connection_url().is_none() {
        warnings.push("No database configured (set DATABASE_URL or HOST/PORT/USER/PASSWORD/DATABASE)");
    }

    if let Some(path) = &config.synonyms.path {
        if !path.exists() {
            warnings.push("Synonym table path does not exist; the plain schema will be used");
        }
    }

    warnings
}

pub async fn show() -> CliResult<()> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> CliResult<()> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
