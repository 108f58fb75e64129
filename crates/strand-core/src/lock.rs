//! Key-scoped mutual exclusion for identify calls.
//!
//! Every call holds the gate shared plus one async mutex per identifier it
//! submits, for its whole read-decide-write sequence. Two calls that share
//! an email or phone number therefore run one after the other, and cannot
//! both observe "no match" and each create a primary.
//!
//! Merging clusters touches records outside the submitted keys, so a call
//! that needs to merge drops its shared guard and takes the gate
//! exclusively instead.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

type KeyTable = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Debug, Default)]
pub struct KeyLocks {
  gate: RwLock<()>,
  keys: Mutex<KeyTable>,
}

/// Held while a call works on its own keys. Releases the key mutexes and
/// prunes idle entries on drop.
pub struct SharedGuard<'a> {
  held:  Vec<OwnedMutexGuard<()>>,
  table: &'a Mutex<KeyTable>,
  _gate: RwLockReadGuard<'a, ()>,
}

/// Held while a call merges clusters. Excludes every other call.
pub struct ExclusiveGuard<'a> {
  _gate: RwLockWriteGuard<'a, ()>,
}

impl KeyLocks {
  pub fn new() -> Self { Self::default() }

  /// Acquire the gate shared, then each key's mutex in sorted order.
  pub async fn shared(&self, keys: &[String]) -> SharedGuard<'_> {
    let gate = self.gate.read().await;

    let mut sorted: Vec<&String> = keys.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mutexes: Vec<Arc<AsyncMutex<()>>> = {
      let mut table = lock_table(&self.keys);
      sorted
        .into_iter()
        .map(|k| table.entry(k.clone()).or_default().clone())
        .collect()
    };

    let mut held = Vec::with_capacity(mutexes.len());
    for m in mutexes {
      held.push(m.lock_owned().await);
    }

    SharedGuard { held, table: &self.keys, _gate: gate }
  }

  /// Wait for every in-flight call to finish, then hold the gate alone.
  pub async fn exclusive(&self) -> ExclusiveGuard<'_> {
    ExclusiveGuard { _gate: self.gate.write().await }
  }

  /// Number of keys currently tracked.
  pub fn tracked_keys(&self) -> usize { lock_table(&self.keys).len() }
}

impl Drop for SharedGuard<'_> {
  fn drop(&mut self) {
    self.held.clear();
    // An entry only the table references has no holder and no waiter.
    lock_table(self.table).retain(|_, m| Arc::strong_count(m) > 1);
  }
}

fn lock_table(table: &Mutex<KeyTable>) -> MutexGuard<'_, KeyTable> {
  table.lock().unwrap_or_else(PoisonError::into_inner)
}
