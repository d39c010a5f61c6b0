//! Backend collaborator and external-provider adapters.
//!
//! - [`PortalBackend`]: every call the portal makes on its backend,
//!   composed from the access, intent and verification traits
//! - [`IdentityVerificationAdapter`]: two-phase redirect/confirm flow plus
//!   the operator override
//! - [`ESignatureAdapter`]: external e-signature vs in-app consent
//! - [`HttpBackend`]: reqwest client for the REST backend
//! - [`InMemoryBackend`]: reference backend with server-side re-validation
//!
//! Backend failures are mapped onto [`investor_types::PortalError`] at this
//! boundary, so callers only ever see the shared taxonomy.

pub mod error;
pub mod esign;
pub mod http;
pub mod marker;
pub mod memory;
pub mod traits;
pub mod verification;

pub use error::{ApiErrorBody, BackendError, BackendResult};
pub use esign::{ESignatureAdapter, SigningChannel};
pub use http::HttpBackend;
pub use marker::{detect_return_marker, strip_return_marker, with_return_marker, DEFAULT_RETURN_PARAM};
pub use memory::{InMemoryBackend, Operation, SigningPolicy};
pub use traits::{
    OperatorConfirmation, PortalBackend, PortalReader, RedirectTarget, VerificationBackend,
    VerificationOutcome,
};
pub use verification::IdentityVerificationAdapter;
