mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hoist",
    about = "Provision and publish Java apps to Azure Functions and App Service"
)]
#[command(version)]
struct Cli {
    /// Project directory containing hoist.toml
    #[arg(long, short = 'C', global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage the app and build its deployment archive
    Package,
    /// Provision Azure resources and publish the app
    Deploy,
    /// Stage the function app and start the local functions host
    Run,
    /// Show the resolved deploy plan without contacting Azure
    Plan,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-silent-result-drop) reason="unset or invalid RUST_LOG falls back to info"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Package => commands::package(&cli.dir)?,
        Commands::Deploy => commands::deploy(&cli.dir)?,
        Commands::Run => commands::run(&cli.dir)?,
        Commands::Plan => commands::plan(&cli.dir)?,
    }

    Ok(())
}
