//! Identity verification commands

use clap::Subcommand;
use investor_portal::InvestorPortal;
use investor_providers::OperatorConfirmation;
use url::Url;

use crate::output::{print_info, print_portal_error, print_success, OutputFormat};

/// Verification subcommands
#[derive(Subcommand)]
pub enum VerifyCommands {
    /// Start verification and print the provider URL to open
    Start,

    /// Handle the page the provider returned to
    Return {
        /// Full URL the browser landed on
        url: Url,
    },

    /// Ask again whether the last verification went through
    Retry,

    /// Operator-confirmed bypass (only when enabled in configuration)
    Override {
        /// Operator identity
        #[arg(long)]
        operator: String,

        /// Acknowledgement phrase, typed verbatim
        #[arg(long)]
        acknowledge: String,
    },
}

/// Execute verification command
pub async fn execute(
    command: VerifyCommands,
    portal: &InvestorPortal,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        VerifyCommands::Start => {
            let target = match portal.start_verification().await {
                Ok(target) => target,
                Err(err) => {
                    print_portal_error(&err);
                    return Err(err.into());
                }
            };
            match format {
                OutputFormat::Json => crate::output::print_json(&target),
                OutputFormat::Text => {
                    print_info("Open this address to verify your identity:");
                    println!("{}", target.url);
                    Ok(())
                }
            }
        }

        VerifyCommands::Return { url } => {
            let load = portal.handle_page_load(&url).await?;
            println!("{}", load.canonical_url);
            match load.confirmation {
                None => {
                    print_info("No verification return marker on this page.");
                    Ok(())
                }
                Some(Ok(())) => {
                    print_success("Identity verified");
                    Ok(())
                }
                Some(Err(err)) => {
                    print_portal_error(&err);
                    Err(err.into())
                }
            }
        }

        VerifyCommands::Retry => match portal.retry_verification_confirmation().await {
            Ok(()) => {
                print_success("Identity verified");
                Ok(())
            }
            Err(err) => {
                print_portal_error(&err);
                Err(err.into())
            }
        },

        VerifyCommands::Override {
            operator,
            acknowledge,
        } => {
            let confirmation = OperatorConfirmation::new(operator, acknowledge);
            match portal.operator_verify(&confirmation).await {
                Ok(()) => {
                    print_success("Identity marked verified by operator override");
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
