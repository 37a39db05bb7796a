use color_eyre::{eyre::eyre, Report};
use std::fmt;
use std::str::FromStr;

/// Endpoints served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
  Employees,
  PaginatedTransactions,
  TransactionsByEmployee,
  SetTransactionApproval,
}

impl Endpoint {
  pub const ALL: [Endpoint; 4] = [
    Endpoint::Employees,
    Endpoint::PaginatedTransactions,
    Endpoint::TransactionsByEmployee,
    Endpoint::SetTransactionApproval,
  ];

  /// Wire name, also the leading segment of every cache key for this endpoint.
  pub fn as_str(&self) -> &'static str {
    match self {
      Endpoint::Employees => "employees",
      Endpoint::PaginatedTransactions => "paginatedTransactions",
      Endpoint::TransactionsByEmployee => "transactionsByEmployee",
      Endpoint::SetTransactionApproval => "setTransactionApproval",
    }
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Endpoint {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Endpoint::ALL
      .into_iter()
      .find(|e| e.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| {
        let known: Vec<&str> = Endpoint::ALL.iter().map(|e| e.as_str()).collect();
        eyre!("Unknown endpoint '{}' (expected one of: {})", s, known.join(", "))
      })
  }
}
