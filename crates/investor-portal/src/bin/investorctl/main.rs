//! investorctl - command-line front end for the investor portal
//!
//! Drives one portal session per invocation:
//! - Show the investor's gates, stage and intent
//! - List documents and open one
//! - Start and confirm identity verification
//! - Review and accept the risk disclaimer
//! - Submit, sign and track an investment intent

use std::sync::Arc;

use clap::{Parser, Subcommand};
use investor_portal::{
    connect_backend, init_logging, BackendKind, FileCache, InvestorPortal, PortalConfig,
};
use tracing::debug;

mod commands;
mod output;

use commands::{disclaimer, documents, intent, verify, walkthrough};
use output::OutputFormat;

/// investorctl application
#[derive(Parser)]
#[command(name = "investorctl")]
#[command(about = "Investor portal access and investment workflow CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "INVESTOR_PORTAL_CONFIG")]
    config: Option<String>,

    /// REST backend endpoint; implies the HTTP backend
    #[arg(short, long, env = "INVESTOR_PORTAL_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer session token for the REST backend
    #[arg(long, env = "INVESTOR_PORTAL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Skip the advisory session cache
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Show gates, access tier, stage and intent status
    Status,

    /// List documents and their lock state
    #[command(alias = "docs")]
    Documents,

    /// Open a document
    Open {
        /// Document ID
        document_id: String,
    },

    /// Identity verification
    Verify {
        #[command(subcommand)]
        command: verify::VerifyCommands,
    },

    /// Risk disclaimer
    Disclaimer {
        #[command(subcommand)]
        command: disclaimer::DisclaimerCommands,
    },

    /// Investment intent
    Intent {
        #[command(subcommand)]
        command: intent::IntentCommands,
    },

    /// Run the full flow against a fresh in-memory backend
    Walkthrough(walkthrough::WalkthroughArgs),

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PortalConfig::load(cli.config.as_deref())?;
    if let Some(endpoint) = &cli.endpoint {
        config.backend.kind = BackendKind::Http;
        config.backend.url = endpoint.clone();
    }
    if cli.token.is_some() {
        config.backend.token = cli.token.clone();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Config => {
            let mut shown = config.clone();
            if shown.backend.token.is_some() {
                shown.backend.token = Some("<redacted>".to_string());
            }
            output::print_json(&shown)
        }
        Commands::Walkthrough(args) => walkthrough::execute(args, &config, cli.output).await,
        command => {
            let portal = open_portal(&config, cli.no_cache).await?;
            match command {
                Commands::Status => commands::status(&portal, cli.output).await,
                Commands::Documents => documents::list(&portal, cli.output).await,
                Commands::Open { document_id } => {
                    documents::open(&portal, document_id, cli.output).await
                }
                Commands::Verify { command } => verify::execute(command, &portal, cli.output).await,
                Commands::Disclaimer { command } => {
                    disclaimer::execute(command, &portal, cli.output).await
                }
                Commands::Intent { command } => intent::execute(command, &portal, cli.output).await,
                Commands::Config | Commands::Walkthrough(_) => Ok(()),
            }
        }
    }
}

/// Build the session and mount it.
async fn open_portal(config: &PortalConfig, no_cache: bool) -> anyhow::Result<InvestorPortal> {
    let backend = connect_backend(config)?;
    let mut portal = InvestorPortal::from_config(backend, config)?;
    if config.cache.enabled && !no_cache {
        portal = portal.with_cache(Arc::new(FileCache::new(config.cache.path.clone())));
        if let Some(cached) = portal.restore_cached().await {
            debug!(status = %cached.intent_status, "Restored cached session view");
        }
    }

    if let Err(err) = portal.mount().await {
        output::print_portal_error(&err);
        return Err(err.into());
    }
    Ok(portal)
}
