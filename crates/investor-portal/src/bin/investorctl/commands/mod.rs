//! CLI command implementations

pub mod disclaimer;
pub mod documents;
pub mod intent;
pub mod verify;
pub mod walkthrough;

use investor_portal::{InvestorPortal, PortalSnapshot};

use crate::output::{self, print_info, print_warning, OutputFormat};

/// Show the session snapshot.
pub async fn status(portal: &InvestorPortal, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = portal.snapshot().await;
    match format {
        OutputFormat::Json => output::print_json(&snapshot),
        OutputFormat::Text => {
            print_snapshot(&snapshot);
            Ok(())
        }
    }
}

pub fn print_snapshot(snapshot: &PortalSnapshot) {
    if let Some(investor) = &snapshot.investor {
        println!("Investor:      {} <{}>", investor.display_name, investor.email);
    }
    println!("Stage:         {:?}", snapshot.stage);
    println!(
        "Identity:      {}",
        if snapshot.gates.identity_verified {
            "verified"
        } else {
            "not verified"
        }
    );
    match (&snapshot.gates.disclaimer_version, &snapshot.disclaimer_version) {
        (Some(accepted), _) if snapshot.gates.disclaimer_accepted => {
            println!("Disclaimer:    accepted {}", accepted)
        }
        _ => println!("Disclaimer:    not accepted"),
    }
    println!("Access:        {:?}", snapshot.access_tier);
    println!("Intent:        {}", snapshot.intent_status);

    if snapshot.needs_reacceptance {
        if let Some(current) = &snapshot.disclaimer_version {
            print_warning(&format!(
                "The disclaimer changed to {}; accept it again to regain full access.",
                current
            ));
        }
    }
    if let Some(gate) = snapshot.missing_gate {
        print_info(gate.prompt());
    }
}
