//! `querysmith suggest`: suggest questions from sampled data.

use querysmith_pipeline::{CompletionClient, suggest_questions};

use super::{CliResult, connect, load_config, load_schema, provider};

pub async fn run(count: usize) -> CliResult<()> {
    let config = load_config()?;
    let provider = provider(&config)?;
    let db = connect(&config).await?;
    let schema = load_schema(&config, db.as_ref()).await?;

    let client = CompletionClient::new(provider, config.default_model.clone())
        .with_temperature(config.temperature);
    let questions = suggest_questions(&client, db.as_ref(), &schema, count).await?;

    for (n, question) in questions.iter().enumerate() {
        println!("{:>3}. {question}", n + 1);
    }
    Ok(())
}
