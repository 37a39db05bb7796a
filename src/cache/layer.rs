//! Request cache that sits between callers and the transport.

use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::key::CacheKey;
use super::payload::CachedPayload;
use super::storage::CacheStorage;
use crate::api::types::SetTransactionApprovalParams;
use crate::api::{Endpoint, Transport};
use crate::error::{CacheError, ParseResult};
use crate::request::RequestTracker;

/// Params argument for endpoints that take none.
pub const NO_PARAMS: Option<&()> = None;

/// Memoizing front for a [`Transport`].
///
/// Storage is shared with whoever owns it; clones of this cache (and the
/// owner) all see the same entries. Every fetch runs through the
/// [`RequestTracker`], so failures come back as `None` with the error kept
/// on the tracker.
///
/// Identical requests that overlap are not coalesced: each one reaches the
/// transport and the last to finish decides what is stored.
pub struct RequestCache<T: Transport> {
  storage: Arc<dyn CacheStorage>,
  transport: Arc<T>,
  tracker: RequestTracker,
}

impl<T: Transport> RequestCache<T> {
  /// Create a cache over the given storage handle and transport.
  pub fn new(storage: Arc<dyn CacheStorage>, transport: T) -> Self {
    Self {
      storage,
      transport: Arc::new(transport),
      tracker: RequestTracker::new(),
    }
  }

  pub fn loading(&self) -> bool {
    self.tracker.loading()
  }

  pub fn last_error(&self) -> Option<String> {
    self.tracker.last_error()
  }

  pub fn clear_error(&self) {
    self.tracker.clear_error()
  }

  /// Fetch through the cache.
  ///
  /// 1. Check storage - if the stored body parses as `D`, return it
  /// 2. A body that does not parse is evicted and treated as a miss
  /// 3. On a miss, fetch from the transport and store the response
  ///
  /// Nothing is stored when the transport fails.
  pub async fn fetch_with_cache<D, P>(&self, endpoint: Endpoint, params: Option<&P>) -> Option<D>
  where
    D: DeserializeOwned,
    P: Serialize + ?Sized,
  {
    self
      .tracker
      .wrapped_request(|| self.cached_fetch(endpoint, params))
      .await
  }

  /// Fetch from the transport, never reading or writing storage.
  pub async fn fetch_without_cache<D, P>(
    &self,
    endpoint: Endpoint,
    params: Option<&P>,
  ) -> Option<D>
  where
    D: DeserializeOwned,
    P: Serialize + ?Sized,
  {
    self
      .tracker
      .wrapped_request(|| self.uncached_fetch(endpoint, params))
      .await
  }

  /// Drop every cached entry.
  pub fn clear_cache(&self) {
    self.storage.clear();
    info!("cache cleared");
  }

  /// Drop the cached entries of the given endpoints.
  pub fn clear_cache_by_endpoint(&self, endpoints: &[Endpoint]) {
    let names: Vec<&str> = endpoints.iter().map(Endpoint::as_str).collect();
    let removed = self.storage.remove_endpoints(&names);
    info!(endpoints = ?names, removed, "cache entries invalidated");
  }

  /// Mirror an approval change into every cached transaction listing.
  ///
  /// Each entry is parsed and written back, changed or not. Entries that are
  /// not transaction pages or transaction lists keep their content. Entries
  /// that fail to parse are logged and left as they are.
  pub fn update_transaction_approval_cache(&self, params: &SetTransactionApprovalParams) {
    let mut patched = 0usize;

    let visited = self.storage.rewrite_all(&mut |key, body| {
      match patch_body(key, body, params) {
        Ok((next, changed)) => {
          if changed {
            patched += 1;
          }
          next
        }
        Err(e) => {
          warn!(error = %e, "leaving cache entry untouched");
          body.to_string()
        }
      }
    });

    debug!(
      transaction_id = %params.transaction_id,
      value = params.value,
      visited,
      patched,
      "approval applied to cache"
    );
  }

  async fn uncached_fetch<D, P>(&self, endpoint: Endpoint, params: Option<&P>) -> Result<D>
  where
    D: DeserializeOwned,
    P: Serialize + ?Sized,
  {
    let params = encode_params(params)?;
    let response = self.transport.fetch(endpoint, params).await?;
    decode_response(endpoint, &response)
  }

  async fn cached_fetch<D, P>(&self, endpoint: Endpoint, params: Option<&P>) -> Result<D>
  where
    D: DeserializeOwned,
    P: Serialize + ?Sized,
  {
    let params = encode_params(params)?;
    let key = CacheKey::new(endpoint, params.as_ref());

    if let Some(body) = self.storage.get(key.as_str()) {
      match parse_body::<D>(&key, &body) {
        Ok(data) => {
          debug!(%key, "cache hit");
          return Ok(data);
        }
        Err(e) => {
          warn!(error = %e, "discarding unreadable cache entry");
          self.storage.remove(key.as_str());
        }
      }
    }

    debug!(%key, "cache miss");
    let response = self.transport.fetch(endpoint, params).await?;
    let data = decode_response(endpoint, &response)?;

    let body = serde_json::to_string(&response).map_err(|source| CacheError::Serialize {
      what: "response",
      source,
    })?;
    self.storage.set(key.as_str(), body);
    debug!(%key, "cache entry stored");

    Ok(data)
  }
}

impl<T: Transport> Clone for RequestCache<T> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      transport: Arc::clone(&self.transport),
      tracker: self.tracker.clone(),
    }
  }
}

fn encode_params<P: Serialize + ?Sized>(params: Option<&P>) -> ParseResult<Option<Value>> {
  params
    .map(serde_json::to_value)
    .transpose()
    .map_err(|source| CacheError::Serialize {
      what: "request params",
      source,
    })
}

fn parse_body<D: DeserializeOwned>(key: &CacheKey, body: &str) -> ParseResult<D> {
  serde_json::from_str(body).map_err(|source| CacheError::Corrupt {
    key: key.to_string(),
    source,
  })
}

fn decode_response<D: DeserializeOwned>(endpoint: Endpoint, response: &Value) -> Result<D> {
  <D as Deserialize>::deserialize(response)
    .map_err(|e| eyre!("Unexpected response from {}: {}", endpoint, e))
}

/// Returns the body to store and whether the approval changed anything.
fn patch_body(
  key: &str,
  body: &str,
  params: &SetTransactionApprovalParams,
) -> ParseResult<(String, bool)> {
  let mut payload = CachedPayload::parse(key, body)?;
  let changed = payload.apply_approval(params);
  Ok((payload.to_body()?, changed))
}
