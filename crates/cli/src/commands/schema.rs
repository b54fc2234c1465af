//! `querysmith schema`: print the schema table the pipeline sees.

use super::{CliResult, connect, load_config, load_schema};

pub async fn run() -> CliResult<()> {
    let config = load_config()?;
    let db = connect(&config).await?;
    let schema = load_schema(&config, db.as_ref()).await?;

    println!("{}", schema.render());
    eprintln!();
    eprintln!("{} columns", schema.len());
    Ok(())
}
