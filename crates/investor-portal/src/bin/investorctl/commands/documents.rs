//! Document commands

use investor_portal::{DocumentLink, InvestorPortal};
use investor_types::DocumentId;

use crate::output::{self, document_line, print_portal_error, print_success, print_warning, OutputFormat};

/// List documents grouped by category, with their lock state.
pub async fn list(portal: &InvestorPortal, format: OutputFormat) -> anyhow::Result<()> {
    let grouped = portal.documents_by_category().await;
    match format {
        OutputFormat::Json => {
            let listing: Vec<_> = grouped
                .values()
                .flatten()
                .map(|entry| {
                    serde_json::json!({
                        "document": entry.document,
                        "locked_by": entry.outcome.missing_gate(),
                    })
                })
                .collect();
            output::print_json(&listing)
        }
        OutputFormat::Text => {
            for (category, entries) in &grouped {
                println!("{}", category);
                for entry in entries {
                    println!("{}", document_line(entry));
                }
            }
            Ok(())
        }
    }
}

/// Open one document: print its retrieval URL or the gate to pass first.
pub async fn open(
    portal: &InvestorPortal,
    document_id: String,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let link = match portal.open_document(&DocumentId::new(document_id)).await {
        Ok(link) => link,
        Err(err) => {
            print_portal_error(&err);
            return Err(err.into());
        }
    };

    match format {
        OutputFormat::Json => output::print_json(&link),
        OutputFormat::Text => {
            match link {
                DocumentLink::Ready(resolved) => {
                    print_success(&resolved.url);
                    if let Some(expires_at) = resolved.expires_at {
                        println!("  expires {}", expires_at.to_rfc3339());
                    }
                }
                DocumentLink::Blocked { prompt, .. } => print_warning(prompt),
            }
            Ok(())
        }
    }
}
