use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "carbon-connect")]
#[command(about = "Connect data sources to Carbon from the command line")]
#[command(version)]
struct Cli {
    /// Host configuration file (TOML)
    #[arg(long, short, env = "CARBON_CONNECT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the integrations this configuration enables
    Integrations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Connect a credential-based integration (guru, freshdesk, github)
    Connect {
        #[arg(value_name = "INTEGRATION")]
        integration: String,

        /// Credential as key=value, repeatable
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Print the consent URL of an OAuth integration
    Oauth {
        #[arg(value_name = "INTEGRATION")]
        integration: String,
    },

    /// Upload local files
    Upload {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Simulate the upload instead of calling the backend
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbon_connect=info,connect_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut host = match &cli.config {
        Some(path) => carbon_connect::load_config(path)
            .with_context(|| format!("Cannot start with config {}", path.display()))?,
        None => carbon_connect::HostConfig::default(),
    };
    carbon_connect::config::apply_env_overrides(&mut host);

    match cli.command {
        Commands::Integrations { json } => commands::integrations(host, json),
        Commands::Connect {
            integration,
            fields,
        } => commands::connect(host, &integration, &fields).await,
        Commands::Oauth { integration } => commands::oauth(host, &integration).await,
        Commands::Upload { files, dry_run } => commands::upload(host, &files, dry_run).await,
    }
}
