use color_eyre::Result;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::endpoint::Endpoint;

/// Something that can answer a request for an endpoint.
///
/// Params arrive already serialized, the same value that forms the cache key.
pub trait Transport: Send + Sync {
  fn fetch(
    &self,
    endpoint: Endpoint,
    params: Option<Value>,
  ) -> impl Future<Output = Result<Value>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
  fn fetch(
    &self,
    endpoint: Endpoint,
    params: Option<Value>,
  ) -> impl Future<Output = Result<Value>> + Send {
    (**self).fetch(endpoint, params)
  }
}
