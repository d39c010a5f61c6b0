//! Investment Intent state machine.
//!
//! Carries one investor's investment declaration from submission through
//! signature:
//!
//! ```text
//! NONE --submit--> (backend picks signing method)
//!          external-e-sign -> SAFE_SENT
//!          in-app-consent  -> CONSENT_PENDING
//! SAFE_SENT       --(observed on re-read)-->   SIGNED
//! SAFE_SENT       --resend signing link-->     SAFE_SENT
//! CONSENT_PENDING --sign consent(legal name)-> SIGNED
//! ```
//!
//! ## Invariants
//!
//! - Submission is only valid from `NONE`; a pending or signed intent is
//!   never overwritten.
//! - The risk acknowledgment is checked before any network call.
//! - Status advances only on a confirmed backend response. `SIGNED` is
//!   reported by the backend, never inferred locally.
//! - `SAFE_SENT -> SIGNED` has no client trigger; it is observed by
//!   [`IntentWorkflow::refresh`].

pub mod error;
pub mod machine;
pub mod mocks;
pub mod request;
pub mod traits;
pub mod workflow;

pub use error::TransitionError;
pub use machine::{IntentEvent, IntentStateMachine, IntentStep};
pub use mocks::MockIntentBackend;
pub use request::{IntentRequest, SubmitIntentPayload};
pub use traits::IntentBackend;
pub use workflow::IntentWorkflow;
