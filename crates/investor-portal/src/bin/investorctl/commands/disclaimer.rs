//! Disclaimer commands

use clap::Subcommand;
use investor_portal::InvestorPortal;
use investor_types::DisclaimerVersion;

use crate::output::{self, print_portal_error, print_success, print_warning, OutputFormat};

/// Disclaimer subcommands
#[derive(Subcommand)]
pub enum DisclaimerCommands {
    /// Show the current disclaimer definition
    Show,

    /// Accept the disclaimer
    Accept {
        /// Version being accepted, as shown
        #[arg(long = "version")]
        definition_version: String,

        /// Checked item IDs (repeat for each item)
        #[arg(short, long = "item")]
        items: Vec<String>,
    },
}

/// Execute disclaimer command
pub async fn execute(
    command: DisclaimerCommands,
    portal: &InvestorPortal,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        DisclaimerCommands::Show => {
            let Some(definition) = portal.disclaimer().await else {
                print_warning("The disclaimer is unavailable right now; gated documents stay locked.");
                return Ok(());
            };
            match format {
                OutputFormat::Json => output::print_json(&definition),
                OutputFormat::Text => {
                    println!("Version {}", definition.version);
                    for item in &definition.items {
                        let required = if item.required { "required" } else { "optional" };
                        println!("  [{}] {} ({})", item.id, item.label, required);
                        println!("      {}", item.text);
                    }
                    Ok(())
                }
            }
        }

        DisclaimerCommands::Accept {
            definition_version,
            items,
        } => {
            let version = DisclaimerVersion::new(definition_version);
            match portal.accept_disclaimer(&items, &version).await {
                Ok(()) => {
                    print_success(&format!("Disclaimer {} accepted", version));
                    Ok(())
                }
                Err(err) => {
                    print_portal_error(&err);
                    Err(err.into())
                }
            }
        }
    }
}
