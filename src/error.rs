use thiserror::Error;

/// Failures at the boundary between stored strings and typed payloads.
#[derive(Debug, Error)]
pub enum CacheError {
  /// A stored body is not valid JSON, or not the shape the caller asked for.
  #[error("cache entry '{key}' could not be parsed: {source}")]
  Corrupt {
    key: String,
    #[source]
    source: serde_json::Error,
  },

  /// A value could not be serialized for storage or keying.
  #[error("failed to serialize {what}: {source}")]
  Serialize {
    what: &'static str,
    #[source]
    source: serde_json::Error,
  },
}

/// Result of turning a stored string into a typed value.
///
/// Every read of a cache entry returns one of these, so each caller decides
/// what corruption means for it.
pub type ParseResult<T> = std::result::Result<T, CacheError>;
