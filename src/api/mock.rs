//! In-process backend that simulates the transactions API.

use chrono::{Duration as ChronoDuration, NaiveDate};
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::endpoint::Endpoint;
use super::transport::Transport;
use super::types::{
  Employee, PaginatedRequestParams, PaginatedResponse, RequestByEmployeeParams,
  SetTransactionApprovalParams, Transaction,
};

const EMPLOYEES: &[(&str, &str, &str)] = &[
  ("emp-1", "James", "Smith"),
  ("emp-2", "Mary", "Johnson"),
  ("emp-3", "Robert", "Brown"),
  ("emp-4", "Linda", "Davis"),
];

const MERCHANTS: &[&str] = &[
  "Social Media Ads Inc",
  "Uber",
  "Figma",
  "Blue Bottle Coffee",
  "Amazon Web Services",
  "Delta Air Lines",
];

const TRANSACTION_COUNT: usize = 18;

struct BackendData {
  employees: Vec<Employee>,
  transactions: Vec<Transaction>,
}

impl BackendData {
  fn seeded() -> Self {
    let employees: Vec<Employee> = EMPLOYEES
      .iter()
      .map(|(id, first, last)| Employee {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
      })
      .collect();

    let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
    let transactions = (0..TRANSACTION_COUNT)
      .map(|i| Transaction {
        id: format!("txn-{:03}", i + 1),
        amount: ((i * 137) % 900 + 12) as f64 + [0.0, 0.25, 0.5, 0.99][i % 4],
        employee: employees[i % employees.len()].clone(),
        merchant: MERCHANTS[i % MERCHANTS.len()].to_string(),
        date: (base + ChronoDuration::days(i as i64))
          .format("%Y-%m-%d")
          .to_string(),
        approved: i % 3 == 0,
      })
      .collect();

    Self {
      employees,
      transactions,
    }
  }
}

/// Simulated API with configurable latency.
///
/// Clones share the same data, so approvals made through one handle are
/// visible through all of them.
#[derive(Clone)]
pub struct MockBackend {
  data: Arc<Mutex<BackendData>>,
  latency: Duration,
  page_size: usize,
}

impl MockBackend {
  pub fn new(latency: Duration, page_size: usize) -> Self {
    Self {
      data: Arc::new(Mutex::new(BackendData::seeded())),
      latency,
      page_size: page_size.max(1),
    }
  }

  fn paginated_transactions(
    &self,
    data: &BackendData,
    params: PaginatedRequestParams,
  ) -> Result<PaginatedResponse<Vec<Transaction>>> {
    let page = params.page.unwrap_or(0) as usize;
    let start = page * self.page_size;
    let total = data.transactions.len();

    if start >= total && !(page == 0 && total == 0) {
      return Err(eyre!("Invalid page {}", page));
    }

    let end = (start + self.page_size).min(total);
    let next_page = if end < total {
      Some(page as u32 + 1)
    } else {
      None
    };

    Ok(PaginatedResponse {
      data: data.transactions[start..end].to_vec(),
      next_page,
    })
  }

  fn transactions_by_employee(
    &self,
    data: &BackendData,
    params: RequestByEmployeeParams,
  ) -> Result<Vec<Transaction>> {
    if params.employee_id.is_empty() {
      return Err(eyre!("Employee id cannot be empty"));
    }

    Ok(
      data
        .transactions
        .iter()
        .filter(|t| t.employee.id == params.employee_id)
        .cloned()
        .collect(),
    )
  }

  fn set_transaction_approval(
    &self,
    data: &mut BackendData,
    params: SetTransactionApprovalParams,
  ) -> Result<()> {
    let txn = data
      .transactions
      .iter_mut()
      .find(|t| t.id == params.transaction_id)
      .ok_or_else(|| eyre!("Invalid transaction {}", params.transaction_id))?;

    txn.approved = params.value;
    Ok(())
  }
}

impl Transport for MockBackend {
  async fn fetch(&self, endpoint: Endpoint, params: Option<Value>) -> Result<Value> {
    debug!(%endpoint, ?params, "backend request");

    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }

    let mut data = self
      .data
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let response = match endpoint {
      Endpoint::Employees => serde_json::to_value(&data.employees)?,
      Endpoint::PaginatedTransactions => {
        let params = match params {
          Some(p) => decode_params(endpoint, p)?,
          None => PaginatedRequestParams::default(),
        };
        serde_json::to_value(self.paginated_transactions(&data, params)?)?
      }
      Endpoint::TransactionsByEmployee => {
        let params = decode_params(endpoint, require_params(endpoint, params)?)?;
        serde_json::to_value(self.transactions_by_employee(&data, params)?)?
      }
      Endpoint::SetTransactionApproval => {
        let params = decode_params(endpoint, require_params(endpoint, params)?)?;
        self.set_transaction_approval(&mut data, params)?;
        Value::Null
      }
    };

    Ok(response)
  }
}

fn require_params(endpoint: Endpoint, params: Option<Value>) -> Result<Value> {
  params.ok_or_else(|| eyre!("Endpoint {} requires params", endpoint))
}

fn decode_params<P: DeserializeOwned>(endpoint: Endpoint, params: Value) -> Result<P> {
  serde_json::from_value(params).map_err(|e| eyre!("Invalid params for {}: {}", endpoint, e))
}
