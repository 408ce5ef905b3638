//! FieldScope CLI — classify research descriptions into an academic taxonomy.
//!
//! Maps free-text research descriptions onto a college's unit/field/subfield
//! hierarchy with LLM-backed classification and validation.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
