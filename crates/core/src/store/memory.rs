use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::backend::StorageBackend;
use crate::error::BackendError;

/// In-memory storage backend, mainly for tests.
///
/// Failure switches let tests exercise the store's error paths. With
/// `yield_after_read` enabled, `get` captures the value and then yields to
/// the scheduler before returning it, so interleaved read-modify-write
/// sequences can be reproduced deterministically.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    yield_after_read: AtomicBool,
}

impl MemoryBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend preloaded with a single key.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let backend = Self::default();
        backend.entries.lock().insert(key.into(), value.into());
        backend
    }

    /// Raw value currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Make every `get` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `set` and `remove` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Yield to the scheduler between capturing and returning a read.
    pub fn set_yield_after_read(&self, enabled: bool) {
        self.yield_after_read.store(enabled, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("simulated read failure".into()));
        }
        let value = self.entries.lock().get(key).cloned();
        if self.yield_after_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.check_writable()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_switches_apply() {
        let backend = MemoryBackend::with_value("games", "[]");
        assert_eq!(backend.get("games").await.unwrap().as_deref(), Some("[]"));

        backend.set_fail_writes(true);
        assert!(backend.set("games", "[1]").await.is_err());
        assert!(backend.remove("games").await.is_err());
        assert_eq!(backend.raw("games").as_deref(), Some("[]"));

        backend.set_fail_reads(true);
        assert!(matches!(
            backend.get("games").await,
            Err(BackendError::Unavailable(_))
        ));
    }
}
