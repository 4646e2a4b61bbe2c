use budget_optimizer_agent::{
    agent::BudgetOptimizer,
    cli::process,
    config::{init_tracing, AppConfig},
};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Analyse a Financial State Object and print the updated document.
#[derive(Debug, Parser)]
#[command(name = "budget-optimizer", version)]
struct Cli {
    /// Path to the FSO JSON document; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pretty-print the output document
    #[arg(long)]
    pretty: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let agent = BudgetOptimizer::default();
    let stdout = std::io::stdout().lock();

    match &cli.input {
        Some(path) => process(&agent, BufReader::new(File::open(path)?), stdout, cli.pretty)?,
        None => process(&agent, std::io::stdin().lock(), stdout, cli.pretty)?,
    }

    Ok(())
}
