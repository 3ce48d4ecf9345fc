//! Shared configuration that can be swapped at runtime.
//!
//! The server replaces the stored value on SIGHUP. Request handlers take a
//! cloned snapshot at the start of each callback so a reload never changes
//! the configuration halfway through one. Long-running processors subscribe
//! to be told when to take a fresh snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, watch};

/// A versioned value behind `Arc<RwLock<T>>` with change notification.
pub struct ConfigStore<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    data: RwLock<T>,
    version: AtomicU64,
    version_tx: watch::Sender<u64>,
}

/// Waits for the next update of a [`ConfigStore`].
pub struct ConfigWatcher {
    version_rx: watch::Receiver<u64>,
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
                version_tx,
            }),
        }
    }

    /// Replace the value and wake every watcher.
    pub async fn update(&self, value: T) {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        let version = self.inner.version.fetch_add(1, Ordering::Relaxed) + 1;
        // release the write lock before waking readers
        drop(guard);
        let _ = self.inner.version_tx.send(version);
    }

    /// Number of updates applied since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> ConfigWatcher {
        ConfigWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl<T: Clone> ConfigStore<T> {
    /// Clone the current value out of the lock.
    pub async fn snapshot(&self) -> T {
        self.inner.data.read().await.clone()
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ConfigWatcher {
    /// Resolves once the store has been updated, or errors if it was dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.version_rx.changed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[tokio::test]
    async fn test_update_bumps_version_and_notifies() {
        let store = ConfigStore::new(GatewayConfig::new("M-1", b"a".to_vec()));
        let mut watcher = store.subscribe();

        let before = store.snapshot().await;
        store.update(GatewayConfig::new("M-2", b"b".to_vec())).await;

        watcher.changed().await.unwrap();
        assert_eq!(store.version(), 1);
        assert_eq!(before.merchant_id, "M-1");
        let after = store.snapshot().await;
        assert_eq!(after.merchant_id, "M-2");
        assert_eq!(after.secret_bytes(), b"b");
    }
}
