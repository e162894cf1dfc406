//! Keyed async mutexes that serialize read-check-write sequences per key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

pub struct KeyedLocks<K> {
    inner: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder of `key` remains, then returns a guard.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody is holding or waiting on.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(key).or_default())
        };

        mutex.lock_owned().await
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::<i32>::new());
        let guard = locks.lock(1).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let locks = KeyedLocks::<(i32, i32)>::new();
        let _a = locks.lock((1, 1)).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock((1, 2)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = KeyedLocks::<i32>::new();
        drop(locks.lock(1).await);
        drop(locks.lock(2).await);
        let _held = locks.lock(3).await;
        assert_eq!(locks.len(), 1);
    }
}
