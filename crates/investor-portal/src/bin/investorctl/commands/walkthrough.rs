//! End-to-end walkthrough against the in-memory backend

use std::sync::Arc;

use clap::Args;
use investor_intent::IntentRequest;
use investor_portal::{DocumentLink, InvestorPortal, PortalConfig};
use investor_providers::{with_return_marker, InMemoryBackend, SigningPolicy};
use investor_types::{DocumentId, PaymentMethod};

use super::print_snapshot;
use crate::output::{self, print_info, print_success, OutputFormat};

#[derive(Args)]
pub struct WalkthroughArgs {
    /// Amount to invest, in the smallest currency unit
    #[arg(short, long, default_value = "5000")]
    amount: u64,

    /// Route the signature through the external e-signature provider
    #[arg(long)]
    external: bool,

    /// Legal name used for the in-app consent
    #[arg(long, default_value = "Ada Lovelace")]
    name: String,
}

/// Verify, accept the disclaimer, open a gated document, then invest.
pub async fn execute(
    args: WalkthroughArgs,
    config: &PortalConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let policy = if args.external {
        SigningPolicy::AlwaysExternal
    } else {
        SigningPolicy::AlwaysInApp
    };
    let backend = InMemoryBackend::new().with_policy(policy);
    let portal = InvestorPortal::from_config(Arc::new(backend.clone()), config)?;

    portal.mount().await?;
    print_info("Mounted with a fresh investor");

    portal.start_verification().await?;
    backend.complete_verification_checkout().await;
    let returned = with_return_marker(portal.portal_url(), &config.portal.return_param);
    let load = portal.handle_page_load(&returned).await?;
    if let Some(result) = load.confirmation {
        result?;
    }
    print_success("Identity verified");

    let definition = portal
        .disclaimer()
        .await
        .ok_or_else(|| anyhow::anyhow!("disclaimer definition unavailable"))?;
    let checked: Vec<String> = definition.items.iter().map(|item| item.id.clone()).collect();
    portal.accept_disclaimer(&checked, &definition.version).await?;
    print_success(&format!("Disclaimer {} accepted", definition.version));

    if let DocumentLink::Ready(resolved) = portal.open_document(&DocumentId::new("financials")).await? {
        print_success(&format!("Opened financials: {}", resolved.url));
    }

    let request = IntentRequest::new(args.amount, PaymentMethod::Wire)
        .accredited(true)
        .risk_acknowledged(true);
    let intent = portal.submit_intent(&request).await?;
    print_success(&format!("Intent {} submitted ({})", intent.id, intent.status));

    if args.external {
        backend.complete_external_signature().await;
        portal.refresh_intent().await?;
    } else {
        portal.sign_consent(&args.name).await?;
    }

    let snapshot = portal.snapshot().await;
    match format {
        OutputFormat::Json => output::print_json(&snapshot),
        OutputFormat::Text => {
            print_snapshot(&snapshot);
            Ok(())
        }
    }
}
