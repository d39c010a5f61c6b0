//! Investment intent commands

use clap::Subcommand;
use investor_intent::{IntentRequest, IntentStep};
use investor_portal::InvestorPortal;
use investor_providers::SigningChannel;
use investor_types::{IntentStatus, PaymentMethod, PortalResult};

use crate::output::{self, print_info, print_portal_error, print_success, OutputFormat};

/// Intent subcommands
#[derive(Subcommand)]
pub enum IntentCommands {
    /// Show the current intent and next step
    Show,

    /// Submit an investment intent
    Submit {
        /// Amount in the smallest currency unit
        #[arg(short, long)]
        amount: u64,

        /// Payment method (wire, ach, check)
        #[arg(short, long, default_value = "wire")]
        method: PaymentMethod,

        /// Confirm accredited investor status
        #[arg(long)]
        accredited: bool,

        /// Acknowledge the investment risk
        #[arg(long)]
        acknowledge_risk: bool,
    },

    /// Sign the in-app consent with your legal name
    Sign {
        /// Legal name, typed as the signature
        #[arg(short, long)]
        name: String,
    },

    /// Resend the external signing link
    Resend,

    /// Re-read the intent to pick up an external signature
    Refresh,
}

/// Execute intent command
pub async fn execute(
    command: IntentCommands,
    portal: &InvestorPortal,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        IntentCommands::Show => {
            let intent = portal.intent().await;
            let step = IntentStep::for_intent(intent.as_ref());
            match format {
                OutputFormat::Json => output::print_json(&serde_json::json!({
                    "intent": intent,
                    "step": step,
                    "raise": portal.raise_config().await,
                })),
                OutputFormat::Text => {
                    match &intent {
                        Some(intent) => {
                            println!("Intent:   {}", intent.id);
                            println!("Amount:   {}", intent.amount);
                            println!("Method:   {}", intent.payment_method);
                            println!("Status:   {}", intent.status);
                        }
                        None => {
                            if let Some(raise) = portal.raise_config().await {
                                println!(
                                    "Minimum investment: {} {}",
                                    raise.minimum_investment, raise.currency
                                );
                            }
                        }
                    }
                    print_next_step(&portal.signing_channel().await);
                    Ok(())
                }
            }
        }

        IntentCommands::Submit {
            amount,
            method,
            accredited,
            acknowledge_risk,
        } => {
            let request = IntentRequest::new(amount, method)
                .accredited(accredited)
                .risk_acknowledged(acknowledge_risk);
            let intent = report(portal.submit_intent(&request).await)?;
            match format {
                OutputFormat::Json => output::print_json(&intent),
                OutputFormat::Text => {
                    print_success(&format!("Intent {} submitted ({})", intent.id, intent.status));
                    print_next_step(&portal.signing_channel().await);
                    Ok(())
                }
            }
        }

        IntentCommands::Sign { name } => {
            let status = report(portal.sign_consent(&name).await)?;
            print_status(status, format)
        }

        IntentCommands::Resend => {
            report(portal.resend_signing_link().await)?;
            print_success("Signing link sent again");
            Ok(())
        }

        IntentCommands::Refresh => {
            let status = report(portal.refresh_intent().await)?;
            print_status(status, format)
        }
    }
}

fn report<T>(result: PortalResult<T>) -> anyhow::Result<T> {
    result.map_err(|err| {
        print_portal_error(&err);
        err.into()
    })
}

fn print_status(status: IntentStatus, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({ "status": status })),
        OutputFormat::Text => {
            if status == IntentStatus::Signed {
                print_success("Investment signed");
            } else {
                println!("Status: {}", status);
            }
            Ok(())
        }
    }
}

fn print_next_step(channel: &SigningChannel) {
    match channel {
        SigningChannel::NotStarted => print_info("Submit an investment intent to continue."),
        SigningChannel::External => {
            print_info("Check your email for the signing link, then run `intent refresh`.")
        }
        SigningChannel::InApp { consent_id } => print_info(&format!(
            "Sign consent {} with `intent sign --name \"<legal name>\"`.",
            consent_id
        )),
        SigningChannel::Completed { .. } => print_success("Investment complete"),
    }
}
