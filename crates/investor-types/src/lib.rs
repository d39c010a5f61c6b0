//! # investor-types
//!
//! Data model shared by the investor access and investment workflow:
//!
//! - **Gates**: per-investor identity and disclaimer state
//! - **Documents**: tiered investor material and its location reference
//! - **Disclaimers**: versioned acknowledgment definitions
//! - **Intents**: an investor's declared investment and its signing status
//!
//! ## Invariants
//!
//! - `Gates::disclaimer_accepted` implies `Gates::disclaimer_version` is set
//!   to the version the investor actually acknowledged.
//! - Gate booleans only move false -> true.
//! - An intent is never deleted; a failed or abandoned intent stays readable.
//!
//! The [`PortalError`] taxonomy is shared by every crate in the workspace so
//! the presentation layer can branch on [`ErrorKind`] alone.

pub mod disclaimer;
pub mod document;
pub mod error;
pub mod gates;
pub mod ids;
pub mod intent;
pub mod investor;
pub mod raise;

pub use disclaimer::{DisclaimerDefinition, DisclaimerItem};
pub use document::{Document, DocumentCategory, DocumentTier, LocationRef};
pub use error::{ErrorKind, PortalError, PortalResult};
pub use gates::{Gates, MissingGate};
pub use ids::{ConsentId, DisclaimerVersion, DocumentId, IntentId, InvestorId};
pub use intent::{IntentStatus, InvestmentIntent, PaymentMethod, SigningMethod};
pub use investor::{Investor, InvestorStage};
pub use raise::RaiseConfig;
