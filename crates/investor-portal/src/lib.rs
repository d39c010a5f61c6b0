//! # investor-portal
//!
//! Session orchestration for the investor portal. [`InvestorPortal`] wires
//! the gate evaluator, document access controller, disclaimer tracker,
//! intent workflow and both provider adapters around one
//! [`investor_providers::PortalBackend`].
//!
//! Mount order: show the advisory cached view if one exists, then fetch
//! everything authoritatively and replace it. Every operation is guarded
//! against re-entrant invocation.

pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod portal;

pub use cache::{CachedSession, FileCache, MemoryCache, SessionCache};
pub use config::{BackendKind, PortalConfig, ENV_PREFIX};
pub use error::{CacheError, ConfigError};
pub use guard::{InFlight, OperationGuard, PortalOperation};
pub use logging::init_logging;
pub use portal::{connect_backend, DocumentLink, InvestorPortal, PageLoad, PortalSnapshot};
