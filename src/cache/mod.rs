//! Request caching for the transactions API.
//!
//! This module provides an in-memory memoization layer that:
//! - Keys responses by endpoint name plus serialized params
//! - Serves repeated requests from storage without reaching the transport
//! - Invalidates wholesale or per endpoint
//! - Patches cached transaction listings after an approval change

mod key;
mod layer;
mod payload;
mod storage;

pub use key::{key_matches_endpoint, CacheKey, KEY_SEPARATOR};
pub use layer::{RequestCache, NO_PARAMS};
pub use payload::{CachedPayload, PayloadShape};
pub use storage::{CacheStorage, MemoryStorage, NoopStorage};
