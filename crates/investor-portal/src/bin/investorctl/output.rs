//! Output formatting utilities

use colored::*;
use investor_access::{AccessOutcome, DocumentEntry};
use investor_types::{ErrorKind, PortalError};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Print a single item as pretty JSON.
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a portal failure with the user-facing message, and the kind when
/// it is a validation problem.
pub fn print_portal_error(err: &PortalError) {
    if err.is_validation() {
        print_error(&format!("{} ({})", err.user_message(), kind_label(err.kind())));
    } else {
        print_error(&err.user_message());
    }
    if err.is_retryable() {
        print_info("This can be retried.");
    }
}

fn kind_label(kind: ErrorKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", kind))
}

/// One line per document: lock state, id and title.
pub fn document_line(entry: &DocumentEntry) -> String {
    let marker = match &entry.outcome {
        AccessOutcome::Blocked(gate) => format!("locked: {}", gate).red().to_string(),
        AccessOutcome::Open(_) => "open".green().to_string(),
        AccessOutcome::Resolvable(_) => "unlocked".green().to_string(),
    };
    format!(
        "  {:<16} {:<40} [{}]",
        entry.document.id.as_str(),
        entry.document.title,
        marker
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use investor_types::{Document, DocumentTier, LocationRef, MissingGate};

    #[test]
    fn test_kind_label_uses_wire_name() {
        assert_eq!(kind_label(ErrorKind::BelowMinimum), "BELOW_MINIMUM");
    }

    #[test]
    fn test_document_line_names_gate() {
        colored::control::set_override(false);
        let entry = DocumentEntry {
            document: Document::new(
                "financials",
                "Financials",
                DocumentTier::Gated,
                "financials",
                LocationRef::storage("gated/financials.pdf"),
            ),
            outcome: AccessOutcome::Blocked(MissingGate::Identity),
        };
        let line = document_line(&entry);
        assert!(line.contains("financials"));
        assert!(line.contains("locked: IDENTITY"));
    }
}
