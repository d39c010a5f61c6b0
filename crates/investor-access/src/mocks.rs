use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use investor_types::{DisclaimerVersion, PortalError, PortalResult};

use crate::traits::{DisclaimerAcceptor, DocumentResolver, ResolvedUrl};

/// Mock document resolver for testing.
///
/// Fails the first `fail_times` calls with a network failure, then mints
/// URLs of the form `https://store.test/<key>?sig=<n>`.
pub struct MockResolver {
    fail_times: usize,
    calls: AtomicUsize,
}

impl MockResolver {
    /// A resolver that always succeeds.
    pub fn new() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(fail_times: usize) -> Self {
        Self {
            fail_times,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentResolver for MockResolver {
    async fn resolve_location(&self, storage_key: &str) -> PortalResult<ResolvedUrl> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_times {
            return Err(PortalError::NetworkFailure("mock resolver unavailable".into()));
        }
        Ok(ResolvedUrl::permanent(format!(
            "https://store.test/{}?sig={}",
            storage_key, n
        )))
    }
}

/// Mock disclaimer acceptor for testing.
///
/// Can be configured to accept or fail every call.
pub struct MockAcceptor {
    fail: bool,
    calls: AtomicUsize,
    accepted: Mutex<Vec<DisclaimerVersion>>,
}

impl MockAcceptor {
    /// An acceptor that confirms every call.
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            accepted: Mutex::new(Vec::new()),
        }
    }

    /// An acceptor that fails every call with a network failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Versions confirmed so far.
    pub fn accepted(&self) -> Vec<DisclaimerVersion> {
        self.accepted
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

impl Default for MockAcceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisclaimerAcceptor for MockAcceptor {
    async fn accept_disclaimer(
        &self,
        version: &DisclaimerVersion,
        _checked_item_ids: &[String],
    ) -> PortalResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PortalError::NetworkFailure("mock acceptor unavailable".into()));
        }
        if let Ok(mut accepted) = self.accepted.lock() {
            accepted.push(version.clone());
        }
        Ok(())
    }
}
