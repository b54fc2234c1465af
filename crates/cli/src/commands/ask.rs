//! `querysmith ask`: answer one question.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use querysmith_core::event::{EventObserver, EventRecorder};
use querysmith_pipeline::Pipeline;
use tracing::debug;

use super::{CliResult, connect, load_config, load_schema, provider};

pub async fn run(question: Option<String>, trace: Option<PathBuf>) -> CliResult<()> {
    let question = match question {
        Some(q) => q,
        None => prompt_for_question()?,
    };
    if question.trim().is_empty() {
        return Err("No question given".into());
    }

    let config = load_config()?;
    let provider = provider(&config)?;
    let db = connect(&config).await?;
    let schema = load_schema(&config, db.as_ref()).await?;
    debug!(rows = schema.len(), "Schema ready");

    let recorder = Arc::new(EventRecorder::new());
    let mut pipeline = Pipeline::from_config(&config, provider, db);
    if trace.is_some() {
        pipeline = pipeline.with_observer(recorder.clone() as Arc<dyn EventObserver>);
    }

    let report = pipeline.answer(question.trim(), &schema).await?;
    println!("{}", report.answer);

    if let Some(path) = trace {
        std::fs::write(&path, recorder.to_json()?)
            .map_err(|e| format!("Failed to write trace to {}: {e}", path.display()))?;
        eprintln!("Trace written to {}", path.display());
    }

    Ok(())
}

fn prompt_for_question() -> CliResult<String> {
    print!("Enter a question: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
