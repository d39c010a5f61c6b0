//! Advisory session cache.
//!
//! Remembers the last confirmed gate booleans and intent status so the
//! right screen can be shown before the authoritative fetch lands. Never
//! consulted for access decisions, and any cache failure is logged and
//! ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use investor_types::{DisclaimerVersion, Gates, IntentStatus, InvestorId};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investor_id: Option<InvestorId>,
    pub gates: Gates,
    pub intent_status: IntentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer_version: Option<DisclaimerVersion>,
    pub saved_at: DateTime<Utc>,
}

pub trait SessionCache: Send + Sync {
    fn load(&self) -> Result<Option<CachedSession>, CacheError>;
    fn store(&self, session: &CachedSession) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
}

/// JSON file cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionCache for FileCache {
    fn load(&self) -> Result<Option<CachedSession>, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, session: &CachedSession) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write-then-rename so a crash never leaves a torn file behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process cache, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<CachedSession>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: CachedSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionCache for MemoryCache {
    fn load(&self) -> Result<Option<CachedSession>, CacheError> {
        Ok(self.slot.lock().map(|s| s.clone()).unwrap_or_default())
    }

    fn store(&self, session: &CachedSession) -> Result<(), CacheError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CachedSession {
        let mut gates = Gates::empty();
        gates.mark_identity_verified();
        CachedSession {
            investor_id: Some(InvestorId::new("investor-1")),
            gates,
            intent_status: IntentStatus::SafeSent,
            disclaimer_version: None,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_cache_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("session.json"));
        assert!(cache.load().unwrap().is_none());
        cache.clear().unwrap();
    }

    #[test]
    fn test_file_cache_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested/dir/session.json"));
        let stored = session();

        cache.store(&stored).unwrap();
        assert_eq!(cache.load().unwrap(), Some(stored));

        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_reports_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"{not json").unwrap();

        let err = FileCache::new(&path).load().unwrap_err();
        assert!(matches!(err, CacheError::Encoding(_)));
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        assert!(cache.load().unwrap().is_none());
        cache.store(&session()).unwrap();
        assert_eq!(
            cache.load().unwrap().map(|s| s.intent_status),
            Some(IntentStatus::SafeSent)
        );
    }
}
