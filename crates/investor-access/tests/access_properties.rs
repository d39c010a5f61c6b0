//! Property tests: gate evaluation and document access truth tables.

use investor_access::{
    evaluate, AccessOutcome, AccessTier, DocumentAccessController, SessionContext,
};
use investor_types::{
    DisclaimerDefinition, DisclaimerItem, DisclaimerVersion, Document, DocumentTier, Gates,
    LocationRef, MissingGate,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_version() -> impl Strategy<Value = String> {
    prop_oneof![Just("v1"), Just("v2"), Just("2024-03")].prop_map(String::from)
}

/// Gates that respect the accepted-implies-version invariant.
fn arb_gates() -> impl Strategy<Value = Gates> {
    (any::<bool>(), any::<bool>(), arb_version()).prop_map(|(identity, accepted, version)| Gates {
        identity_verified: identity,
        disclaimer_accepted: accepted,
        disclaimer_version: if accepted {
            Some(DisclaimerVersion::new(version))
        } else {
            None
        },
    })
}

fn arb_definition() -> impl Strategy<Value = Option<DisclaimerDefinition>> {
    prop::option::of(arb_version().prop_map(|v| {
        DisclaimerDefinition::new(v, vec![DisclaimerItem::required("risk", "Risk", "High risk.")])
    }))
}

fn arb_document(tier: DocumentTier) -> impl Strategy<Value = Document> {
    ("[a-z]{3,10}", prop::bool::ANY).prop_map(move |(id, storage)| {
        let location = if storage {
            LocationRef::storage(format!("docs/{}.pdf", id))
        } else {
            LocationRef::direct(format!("https://cdn.example.com/{}.pdf", id))
        };
        Document::new(id.clone(), id, tier, "general", location)
    })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// FULL iff both booleans hold and the accepted version is current.
    #[test]
    fn full_iff_all_gates_and_current_version(
        gates in arb_gates(),
        definition in arb_definition(),
    ) {
        let expected_full = gates.identity_verified
            && gates.disclaimer_accepted
            && definition
                .as_ref()
                .map(|d| gates.disclaimer_version.as_ref() == Some(&d.version))
                .unwrap_or(false);

        let tier = evaluate(&gates, definition.as_ref());
        prop_assert_eq!(tier == AccessTier::Full, expected_full);
    }

    /// Tier-1 documents are open regardless of gate state.
    #[test]
    fn tier1_always_open(
        gates in arb_gates(),
        definition in arb_definition(),
        document in arb_document(DocumentTier::Open),
    ) {
        let ctx = SessionContext::new(gates, definition);
        let outcome = DocumentAccessController::new().resolve(&document, &ctx);
        prop_assert_eq!(outcome, AccessOutcome::Open(document.location.clone()));
    }

    /// Unverified identity blocks tier-2 on IDENTITY even with a current acceptance.
    #[test]
    fn unverified_identity_blocks_on_identity(
        version in arb_version(),
        document in arb_document(DocumentTier::Gated),
    ) {
        let gates = Gates {
            identity_verified: false,
            disclaimer_accepted: true,
            disclaimer_version: Some(DisclaimerVersion::new(version.clone())),
        };
        let definition = DisclaimerDefinition::new(version, vec![]);
        let ctx = SessionContext::new(gates, Some(definition));

        let outcome = DocumentAccessController::new().resolve(&document, &ctx);
        prop_assert_eq!(outcome, AccessOutcome::Blocked(MissingGate::Identity));
    }

    /// Tier-2 documents are resolvable exactly when access is FULL.
    #[test]
    fn tier2_resolvable_iff_full(
        gates in arb_gates(),
        definition in arb_definition(),
        document in arb_document(DocumentTier::Gated),
    ) {
        let ctx = SessionContext::new(gates, definition);
        let outcome = DocumentAccessController::new().resolve(&document, &ctx);
        let resolvable = matches!(outcome, AccessOutcome::Resolvable(_));
        prop_assert_eq!(resolvable, ctx.access_tier().is_full());
    }
}
