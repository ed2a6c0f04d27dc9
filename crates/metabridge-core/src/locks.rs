//! Per-source leases.
//!
//! At most one import, load or flush may run for a source scope at a time.
//! Callers take a [`SourceLease`] from a shared [`SourceLocks`] and hand it to
//! the loader, which refuses to work on sources the lease does not cover.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::{Error, Result};

/// Registry of source ids currently leased.
#[derive(Debug, Clone, Default)]
pub struct SourceLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

fn lock(held: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease every id in `source_ids`, or none of them.
    ///
    /// Fails with [`Error::SourceBusy`] when any id is already leased.
    pub fn try_acquire<S: AsRef<str>>(&self, source_ids: &[S]) -> Result<SourceLease> {
        let ids: BTreeSet<String> = source_ids.iter().map(|s| s.as_ref().to_string()).collect();
        if ids.is_empty() {
            return Err(Error::Config("no source id given".to_string()));
        }

        let mut held = lock(&self.held);
        let busy: Vec<&str> = ids
            .iter()
            .filter(|id| held.contains(id.as_str()))
            .map(String::as_str)
            .collect();
        if !busy.is_empty() {
            return Err(Error::SourceBusy(busy.join(", ")));
        }
        held.extend(ids.iter().cloned());
        drop(held);

        debug!(subsystem = "core", component = "locks", sources = ?ids, "Lease acquired");
        Ok(SourceLease {
            ids,
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_held(&self, source_id: &str) -> bool {
        lock(&self.held).contains(source_id)
    }
}

/// Exclusive hold on a set of source ids; released on drop.
#[derive(Debug)]
pub struct SourceLease {
    ids: BTreeSet<String>,
    held: Arc<Mutex<HashSet<String>>>,
}

impl SourceLease {
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn covers<S: AsRef<str>>(&self, source_ids: &[S]) -> bool {
        source_ids.iter().all(|s| self.ids.contains(s.as_ref()))
    }

    /// Error unless the lease covers every id.
    pub fn ensure_covers<S: AsRef<str>>(&self, source_ids: &[S]) -> Result<()> {
        let missing: Vec<&str> = source_ids
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| !self.ids.contains(*s))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::SourceBusy(format!(
                "lease does not cover: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Drop for SourceLease {
    fn drop(&mut self) {
        let mut held = lock(&self.held);
        for id in &self.ids {
            held.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let locks = SourceLocks::new();
        let _lease = locks.try_acquire(&["dzl"]).unwrap();
        let err = locks.try_acquire(&["dzl"]).unwrap_err();
        assert!(matches!(err, Error::SourceBusy(ref s) if s == "dzl"));
    }

    #[test]
    fn test_overlap_is_all_or_nothing() {
        let locks = SourceLocks::new();
        let _a = locks.try_acquire(&["a"]).unwrap();
        assert!(locks.try_acquire(&["b", "a"]).is_err());
        assert!(!locks.is_held("b"));
        assert!(locks.try_acquire(&["b"]).is_ok());
    }

    #[test]
    fn test_drop_releases() {
        let locks = SourceLocks::new();
        {
            let lease = locks.try_acquire(&["dzl", "loinc"]).unwrap();
            assert!(lease.covers(&["dzl"]));
            assert!(!lease.covers(&["dzl", "snomed"]));
        }
        assert!(!locks.is_held("dzl"));
        assert!(locks.try_acquire(&["dzl"]).is_ok());
    }

    #[test]
    fn test_ensure_covers_names_missing() {
        let locks = SourceLocks::new();
        let lease = locks.try_acquire(&["a"]).unwrap();
        assert!(lease.ensure_covers(&["a"]).is_ok());
        let err = lease.ensure_covers(&["a", "b"]).unwrap_err();
        assert_eq!(err.to_string(), "Source busy: lease does not cover: b");
    }

    #[test]
    fn test_empty_request_rejected() {
        let locks = SourceLocks::new();
        let none: [&str; 0] = [];
        assert!(locks.try_acquire(&none).is_err());
    }
}
