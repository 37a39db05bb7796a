//! Typed view over stored response bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::api::types::{PaginatedResponse, SetTransactionApprovalParams, Transaction};
use crate::error::{CacheError, ParseResult};

/// What a stored body turned out to be when it was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
  TransactionPage,
  Transactions,
  Opaque,
}

/// A stored body together with its shape, decided once when it is parsed.
///
/// Shapes are tried in order against the typed structs: a page needs `data`
/// and `nextPage`, and every element of a list must have all the
/// [`Transaction`] fields. Extra fields do not disqualify an element, but a
/// single element that lacks a field makes the whole body `Opaque`, even when
/// the elements before it are transactions.
///
/// The JSON tree is kept as parsed and edited in place, so anything the
/// approval does not touch is written back exactly as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPayload {
  shape: PayloadShape,
  value: Value,
}

impl CachedPayload {
  pub fn parse(key: &str, body: &str) -> ParseResult<Self> {
    let value: Value = serde_json::from_str(body).map_err(|source| CacheError::Corrupt {
      key: key.to_string(),
      source,
    })?;
    Ok(Self {
      shape: classify(&value),
      value,
    })
  }

  pub fn shape(&self) -> PayloadShape {
    self.shape
  }

  pub fn to_body(&self) -> ParseResult<String> {
    serde_json::to_string(&self.value).map_err(|source| CacheError::Serialize {
      what: "cached payload",
      source,
    })
  }

  /// Apply an approval change to every matching transaction in the payload.
  /// Returns whether anything changed.
  pub fn apply_approval(&mut self, params: &SetTransactionApprovalParams) -> bool {
    let txns = match self.shape {
      PayloadShape::TransactionPage => self.value.get_mut("data").and_then(Value::as_array_mut),
      PayloadShape::Transactions => self.value.as_array_mut(),
      PayloadShape::Opaque => None,
    };

    match txns {
      Some(txns) => set_approval(txns, params),
      None => false,
    }
  }
}

fn classify(value: &Value) -> PayloadShape {
  if PaginatedResponse::<Vec<Transaction>>::deserialize(value).is_ok() {
    PayloadShape::TransactionPage
  } else if Vec::<Transaction>::deserialize(value).is_ok() {
    PayloadShape::Transactions
  } else {
    PayloadShape::Opaque
  }
}

fn set_approval(txns: &mut [Value], params: &SetTransactionApprovalParams) -> bool {
  let mut changed = false;
  for txn in txns
    .iter_mut()
    .filter(|t| t["id"].as_str() == Some(params.transaction_id.as_str()))
  {
    changed |= txn["approved"].as_bool() != Some(params.value);
    txn["approved"] = Value::Bool(params.value);
  }
  changed
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn txn(id: &str, approved: bool) -> Value {
    json!({
      "id": id,
      "amount": 42.5,
      "employee": { "id": "emp-1", "firstName": "James", "lastName": "Smith" },
      "merchant": "Uber",
      "date": "2024-03-01",
      "approved": approved
    })
  }

  fn approve(id: &str, value: bool) -> SetTransactionApprovalParams {
    SetTransactionApprovalParams {
      transaction_id: id.to_string(),
      value,
    }
  }

  #[test]
  fn test_parse_classifies_shapes() {
    let page = json!({ "data": [txn("t1", false)], "nextPage": 1 }).to_string();
    let list = json!([txn("t1", false)]).to_string();
    let employees = json!([{ "id": "e1", "firstName": "A", "lastName": "B" }]).to_string();

    assert_eq!(
      CachedPayload::parse("k", &page).unwrap().shape(),
      PayloadShape::TransactionPage
    );
    assert_eq!(
      CachedPayload::parse("k", &list).unwrap().shape(),
      PayloadShape::Transactions
    );
    assert_eq!(
      CachedPayload::parse("k", &employees).unwrap().shape(),
      PayloadShape::Opaque
    );
  }

  #[test]
  fn test_page_without_next_page_is_opaque() {
    let body = json!({ "data": [txn("t1", false)] }).to_string();
    assert_eq!(
      CachedPayload::parse("k", &body).unwrap().shape(),
      PayloadShape::Opaque
    );
  }

  #[test]
  fn test_mixed_array_is_opaque() {
    let body = json!([txn("t1", false), { "id": "x" }]).to_string();
    let mut payload = CachedPayload::parse("k", &body).unwrap();

    assert_eq!(payload.shape(), PayloadShape::Opaque);
    assert!(!payload.apply_approval(&approve("t1", true)));
    assert_eq!(payload.to_body().unwrap(), body);
  }

  #[test]
  fn test_corrupt_body_reports_key() {
    let err = CachedPayload::parse("employees", "{not json").unwrap_err();
    assert!(matches!(err, CacheError::Corrupt { .. }));
    assert!(err.to_string().contains("employees"));
  }

  #[test]
  fn test_apply_approval_on_page_changes_only_target() {
    let body = json!({ "data": [txn("t1", false), txn("t2", true)], "nextPage": null }).to_string();
    let mut payload = CachedPayload::parse("k", &body).unwrap();

    assert!(payload.apply_approval(&approve("t1", true)));

    let expected =
      json!({ "data": [txn("t1", true), txn("t2", true)], "nextPage": null }).to_string();
    assert_eq!(payload.to_body().unwrap(), expected);
  }

  #[test]
  fn test_apply_approval_without_match_is_unchanged() {
    let body = json!([txn("t1", false)]).to_string();
    let mut payload = CachedPayload::parse("k", &body).unwrap();

    assert!(!payload.apply_approval(&approve("t9", true)));
    assert_eq!(payload.to_body().unwrap(), body);
  }

  #[test]
  fn test_opaque_round_trip_preserves_key_order() {
    let body = r#"{"zeta":1,"alpha":[true,null],"mid":{"b":"x","a":"y"}}"#;
    let payload = CachedPayload::parse("k", body).unwrap();
    assert_eq!(payload.to_body().unwrap(), body);
  }

  #[test]
  fn test_extra_fields_still_count_as_transactions() {
    let mut item = txn("t1", false);
    item["category"] = json!("travel");
    let body = json!([item]).to_string();
    let mut payload = CachedPayload::parse("k", &body).unwrap();

    assert_eq!(payload.shape(), PayloadShape::Transactions);
    assert!(payload.apply_approval(&approve("t1", true)));

    let patched: Value = serde_json::from_str(&payload.to_body().unwrap()).unwrap();
    assert_eq!(patched[0]["approved"], true);
    assert_eq!(patched[0]["category"], "travel");
  }

  #[test]
  fn test_integer_amounts_are_written_back_as_read() {
    let mut t1 = txn("t1", false);
    let mut t2 = txn("t2", true);
    t1["amount"] = json!(100);
    t2["amount"] = json!(250);
    let body = json!({ "data": [t1, t2], "nextPage": null }).to_string();

    let mut unmatched = CachedPayload::parse("k", &body).unwrap();
    assert!(!unmatched.apply_approval(&approve("t9", true)));
    assert_eq!(unmatched.to_body().unwrap(), body);

    let mut matched = CachedPayload::parse("k", &body).unwrap();
    assert!(matched.apply_approval(&approve("t1", true)));
    let expected = body.replacen(r#""approved":false"#, r#""approved":true"#, 1);
    assert_eq!(matched.to_body().unwrap(), expected);
  }
}
