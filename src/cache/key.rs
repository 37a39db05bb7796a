use serde_json::Value;
use std::fmt;

use crate::api::Endpoint;

/// Separates the endpoint name from the serialized params in a key.
pub const KEY_SEPARATOR: char = '@';

/// Cache key for an (endpoint, params) pair.
///
/// Format is `<endpoint>` without params and `<endpoint>@<json>` with them.
/// Params that serialize to `null` count as no params.
/// Params serialize in field declaration order, so equal params always
/// produce byte-identical keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
  pub fn new(endpoint: Endpoint, params: Option<&Value>) -> Self {
    match params {
      Some(params) if !params.is_null() => {
        Self(format!("{}{}{}", endpoint.as_str(), KEY_SEPARATOR, params))
      }
      _ => Self(endpoint.as_str().to_string()),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Whether `key` was produced for the endpoint named `endpoint`.
///
/// Matches the bare name and `name@...`, but not keys of another endpoint
/// whose name merely starts with the same characters. This is stricter than
/// a literal `starts_with(endpoint)` test, which would also take `ab` for `a`.
pub fn key_matches_endpoint(key: &str, endpoint: &str) -> bool {
  match key.strip_prefix(endpoint) {
    Some(rest) => rest.is_empty() || rest.starts_with(KEY_SEPARATOR),
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{PaginatedRequestParams, SetTransactionApprovalParams};
  use serde_json::json;

  #[test]
  fn test_key_without_params_is_endpoint_name() {
    let key = CacheKey::new(Endpoint::Employees, None);
    assert_eq!(key.as_str(), "employees");
  }

  #[test]
  fn test_null_params_give_bare_key() {
    let key = CacheKey::new(Endpoint::Employees, Some(&Value::Null));
    assert_eq!(key.as_str(), "employees");
  }

  #[test]
  fn test_key_with_params_appends_json() {
    let params = serde_json::to_value(PaginatedRequestParams { page: Some(2) }).unwrap();
    let key = CacheKey::new(Endpoint::PaginatedTransactions, Some(&params));
    assert_eq!(key.as_str(), r#"paginatedTransactions@{"page":2}"#);
  }

  #[test]
  fn test_null_page_is_still_part_of_key() {
    let params = serde_json::to_value(PaginatedRequestParams { page: None }).unwrap();
    let key = CacheKey::new(Endpoint::PaginatedTransactions, Some(&params));
    assert_eq!(key.as_str(), r#"paginatedTransactions@{"page":null}"#);
  }

  #[test]
  fn test_equal_params_give_equal_keys() {
    let a = SetTransactionApprovalParams {
      transaction_id: "t1".to_string(),
      value: true,
    };
    let b = a.clone();

    let key_a = CacheKey::new(
      Endpoint::SetTransactionApproval,
      Some(&serde_json::to_value(&a).unwrap()),
    );
    let key_b = CacheKey::new(
      Endpoint::SetTransactionApproval,
      Some(&serde_json::to_value(&b).unwrap()),
    );
    assert_eq!(key_a, key_b);
  }

  #[test]
  fn test_different_params_give_different_keys() {
    let a = CacheKey::new(Endpoint::TransactionsByEmployee, Some(&json!({ "employeeId": "1" })));
    let b = CacheKey::new(Endpoint::TransactionsByEmployee, Some(&json!({ "employeeId": "2" })));
    assert_ne!(a, b);
  }

  #[test]
  fn test_key_matches_endpoint_segment_only() {
    assert!(key_matches_endpoint("a", "a"));
    assert!(key_matches_endpoint(r#"a@{"page":1}"#, "a"));
    assert!(!key_matches_endpoint("ab", "a"));
    assert!(!key_matches_endpoint("b@a", "a"));
  }
}
