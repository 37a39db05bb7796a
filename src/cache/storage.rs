//! Cache storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::key::key_matches_endpoint;

/// Trait for cache storage backends.
///
/// Entries map a cache key to the serialized response body. Storage never
/// interprets bodies; parsing happens in the cache layer.
pub trait CacheStorage: Send + Sync {
  /// Get the stored body for a key.
  fn get(&self, key: &str) -> Option<String>;

  /// Store a body, replacing any previous one.
  fn set(&self, key: &str, body: String);

  /// Remove a single entry. Returns whether it existed.
  fn remove(&self, key: &str) -> bool;

  /// All keys, sorted.
  fn keys(&self) -> Vec<String>;

  /// Replace the contents with an empty map.
  fn clear(&self);

  /// Remove every entry that belongs to one of the named endpoints.
  /// Returns how many entries were removed.
  fn remove_endpoints(&self, endpoints: &[&str]) -> usize;

  /// Replace every body with `rewrite(key, body)`. Returns how many entries
  /// were visited.
  fn rewrite_all(&self, rewrite: &mut dyn FnMut(&str, &str) -> String) -> usize;
}

/// Storage used when caching is unavailable.
/// Reads always miss and writes are discarded.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Option<String> {
    None // Always miss
  }

  fn set(&self, _key: &str, _body: String) {} // Discard

  fn remove(&self, _key: &str) -> bool {
    false
  }

  fn keys(&self) -> Vec<String> {
    Vec::new()
  }

  fn clear(&self) {}

  fn remove_endpoints(&self, _endpoints: &[&str]) -> usize {
    0
  }

  fn rewrite_all(&self, _rewrite: &mut dyn FnMut(&str, &str) -> String) -> usize {
    0
  }
}

/// Process-local storage. Lives as long as the owning context.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries().is_empty()
  }

  // Entries are plain strings, so a panic elsewhere cannot leave them half-written.
  fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Option<String> {
    self.entries().get(key).cloned()
  }

  fn set(&self, key: &str, body: String) {
    self.entries().insert(key.to_string(), body);
  }

  fn remove(&self, key: &str) -> bool {
    self.entries().remove(key).is_some()
  }

  fn keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.entries().keys().cloned().collect();
    keys.sort();
    keys
  }

  fn clear(&self) {
    *self.entries() = HashMap::new();
  }

  fn remove_endpoints(&self, endpoints: &[&str]) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|key, _| !endpoints.iter().any(|e| key_matches_endpoint(key, e)));
    before - entries.len()
  }

  fn rewrite_all(&self, rewrite: &mut dyn FnMut(&str, &str) -> String) -> usize {
    let mut entries = self.entries();
    for (key, body) in entries.iter_mut() {
      let next = rewrite(key, body.as_str());
      *body = next;
    }
    entries.len()
  }
}
