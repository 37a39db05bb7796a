use serde::{Deserialize, Deserializer, Serialize};

/// Employee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id: String,
  pub first_name: String,
  pub last_name: String,
}

/// Card transaction awaiting (or holding) an approval decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  pub id: String,
  pub amount: f64,
  pub employee: Employee,
  pub merchant: String,
  pub date: String, // YYYY-MM-DD
  pub approved: bool,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
  pub data: T,
  /// `null` on the last page. The field must be present, even when null.
  #[serde(deserialize_with = "deserialize_required_nullable")]
  pub next_page: Option<u32>,
}

/// Params for `paginatedTransactions`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedRequestParams {
  pub page: Option<u32>,
}

/// Params for `transactionsByEmployee`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestByEmployeeParams {
  pub employee_id: String,
}

/// Params for `setTransactionApproval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTransactionApprovalParams {
  pub transaction_id: String,
  pub value: bool,
}

// With `deserialize_with`, serde no longer treats a missing Option field as None.
fn deserialize_required_nullable<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<u32>::deserialize(deserializer)
}
