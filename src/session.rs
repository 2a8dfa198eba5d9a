//! Session storage
//!
//! A cart is bound to one logical session, but overlapping requests may hit
//! the same session. Access is serialized through an advisory per-session
//! lock: `restore` acquires it with a bounded wait, `save` (or `discard`)
//! releases it. The wait is bounded so contention surfaces as
//! [`SessionError::Locked`] instead of hanging the request.

use std::{
    sync::{Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use humanize_duration::{Truncate, prelude::DurationExt};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// How often a waiting accessor re-checks a held session lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from session storage access.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Another accessor held the session lock past the allowed wait.
    #[error("session {key:?} still locked after {}", .waited.human(Truncate::Millis))]
    Locked {
        /// Session key whose lock could not be acquired.
        key: String,

        /// Total time spent waiting before giving up.
        waited: Duration,
    },
}

/// Opaque blob storage keyed by session id, with an advisory per-session
/// lock serializing restore/mutate/save cycles.
pub trait SessionStore {
    /// Whether a blob is stored under `key`.
    fn has(&self, key: &str) -> bool;

    /// Fetch the blob stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a blob under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String);

    /// Acquire the session lock for `key`, waiting at most `max_wait`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Locked`] if the lock is still held when the
    /// wait budget runs out.
    fn acquire(&self, key: &str, max_wait: Duration) -> Result<(), SessionError>;

    /// Release the session lock for `key`. Releasing an unheld lock is a
    /// no-op.
    fn release(&self, key: &str);
}

/// A session store held entirely in memory, for tests, demos, and
/// single-process deployments.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<FxHashMap<String, String>>,
    locks: Mutex<FxHashSet<String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn has(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn acquire(&self, key: &str, max_wait: Duration) -> Result<(), SessionError> {
        let started = Instant::now();

        loop {
            let newly_locked = self
                .locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_string());

            if newly_locked {
                tracing::trace!(key, "session lock acquired");
                return Ok(());
            }

            let waited = started.elapsed();

            if waited >= max_wait {
                tracing::warn!(key, ?waited, "session lock wait exhausted");
                return Err(SessionError::Locked {
                    key: key.to_string(),
                    waited,
                });
            }

            tracing::debug!(key, "session locked by another accessor; waiting");
            thread::sleep(LOCK_POLL_INTERVAL.min(max_wait.saturating_sub(waited)));
        }
    }

    fn release(&self, key: &str) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        tracing::trace!(key, "session lock released");
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn put_get_has_round_trip() {
        let store = MemorySessionStore::new();

        assert!(!store.has("cart:1"));
        assert_eq!(store.get("cart:1"), None);

        store.put("cart:1", "blob".to_string());

        assert!(store.has("cart:1"));
        assert_eq!(store.get("cart:1"), Some("blob".to_string()));
    }

    #[test]
    fn acquire_is_exclusive_per_key() -> TestResult {
        let store = MemorySessionStore::new();

        store.acquire("cart:1", Duration::ZERO)?;

        // A different session is unaffected.
        store.acquire("cart:2", Duration::ZERO)?;

        let contended = store.acquire("cart:1", Duration::from_millis(60));

        assert!(matches!(
            contended,
            Err(SessionError::Locked { ref key, waited }) if key == "cart:1" && waited >= Duration::from_millis(60)
        ));

        Ok(())
    }

    #[test]
    fn release_allows_reacquisition() -> TestResult {
        let store = MemorySessionStore::new();

        store.acquire("cart:1", Duration::ZERO)?;
        store.release("cart:1");
        store.acquire("cart:1", Duration::ZERO)?;

        Ok(())
    }

    #[test]
    fn release_of_unheld_lock_is_noop() {
        let store = MemorySessionStore::new();

        store.release("cart:never-locked");
    }

    #[test]
    fn contended_lock_is_released_by_other_thread() -> TestResult {
        let store = std::sync::Arc::new(MemorySessionStore::new());

        store.acquire("cart:1", Duration::ZERO)?;

        let holder = std::sync::Arc::clone(&store);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            holder.release("cart:1");
        });

        // Outlasts the holder's sleep, so the bounded wait succeeds.
        store.acquire("cart:1", Duration::from_secs(5))?;

        handle
            .join()
            .map_err(|_err| std::io::Error::other("holder thread panicked"))?;

        Ok(())
    }
}
