//! Investor access control.
//!
//! Decides, per document, whether an investor may view it:
//!
//! 1. **Gate Evaluator**: pure function over [`Gates`] and the current
//!    disclaimer definition producing an [`AccessTier`]
//! 2. **Document Access Controller**: maps a document and the session's
//!    gate state onto an [`AccessOutcome`] (open, blocked, or resolvable)
//! 3. **Disclaimer Acceptance Tracker**: validates and records acceptance of
//!    the current disclaimer version
//!
//! ## Invariants
//!
//! - Evaluation fails closed: an unavailable disclaimer definition yields
//!   [`AccessTier::Tier1Only`].
//! - Identity is always prompted before the disclaimer.
//! - Gate state is updated only after a confirmed backend response, and a
//!   failed document resolution never touches gate state.
//!
//! [`Gates`]: investor_types::Gates

pub mod controller;
pub mod disclaimer;
pub mod evaluator;
pub mod mocks;
pub mod session;
pub mod traits;

pub use controller::{AccessOutcome, DocumentAccessController, DocumentEntry, ResolverCall};
pub use disclaimer::{AcceptanceRequest, DisclaimerTracker};
pub use evaluator::{evaluate, missing_gate, AccessTier};
pub use mocks::{MockAcceptor, MockResolver};
pub use session::SessionContext;
pub use traits::{DisclaimerAcceptor, DocumentResolver, ResolvedUrl};
