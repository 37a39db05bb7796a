use color_eyre::Result;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::api::types::{
  Employee, PaginatedRequestParams, PaginatedResponse, RequestByEmployeeParams,
  SetTransactionApprovalParams, Transaction,
};
use crate::api::{Endpoint, MockBackend, Transport};
use crate::cache::{CacheStorage, MemoryStorage, NoopStorage, RequestCache, NO_PARAMS};
use crate::commands::{self, Action, COMMANDS};
use crate::config::{CacheConfig, Config};

const PROGRESS_TICK: Duration = Duration::from_millis(250);

/// State shared by everything in a session. Owns the cache storage.
pub struct AppContext {
  pub cache: Arc<dyn CacheStorage>,
}

impl AppContext {
  pub fn new(config: &CacheConfig) -> Self {
    let cache: Arc<dyn CacheStorage> = if config.enabled {
      Arc::new(MemoryStorage::new())
    } else {
      Arc::new(NoopStorage)
    };
    Self { cache }
  }
}

/// Line-oriented session over the cached API
pub struct App<T: Transport> {
  context: AppContext,
  api: RequestCache<T>,
  should_quit: bool,
}

impl App<MockBackend> {
  pub fn new(config: &Config) -> Self {
    let backend = MockBackend::new(config.latency(), config.backend.page_size);
    Self::with_transport(AppContext::new(&config.cache), backend)
  }
}

impl<T: Transport> App<T> {
  pub fn with_transport(context: AppContext, transport: T) -> Self {
    let api = RequestCache::new(Arc::clone(&context.cache), transport);
    Self {
      context,
      api,
      should_quit: false,
    }
  }

  /// Read commands until `quit` or end of input.
  pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
  where
    R: AsyncBufRead + Unpin,
    W: Write,
  {
    writeln!(out, "txcache - type 'help' for commands")?;
    self.load_initial_data(out).await?;

    let mut lines = input.lines();
    while !self.should_quit {
      write!(out, "> ")?;
      out.flush()?;

      let Some(line) = lines.next_line().await? else {
        break;
      };

      match commands::parse(&line) {
        Ok(Some(action)) => self.handle_action(action, out).await?,
        Ok(None) => {}
        Err(e) => writeln!(out, "{}", e)?,
      }
    }

    Ok(())
  }

  /// Employees and the first page load together, as the list view needs both.
  async fn load_initial_data<W: Write>(&self, out: &mut W) -> Result<()> {
    let first_page = PaginatedRequestParams { page: None };
    let (employees, transactions) = self
      .with_progress(out, async {
        futures::join!(
          self
            .api
            .fetch_with_cache::<Vec<Employee>, _>(Endpoint::Employees, NO_PARAMS),
          self.api.fetch_with_cache::<PaginatedResponse<Vec<Transaction>>, _>(
            Endpoint::PaginatedTransactions,
            Some(&first_page),
          ),
        )
      })
      .await?;

    match (employees, transactions) {
      (Some(employees), Some(page)) => writeln!(
        out,
        "Loaded {} employees and {} transactions",
        employees.len(),
        page.data.len()
      )?,
      _ => self.report_error(out)?,
    }
    Ok(())
  }

  async fn handle_action<W: Write>(&mut self, action: Action, out: &mut W) -> Result<()> {
    debug!(?action, "handling command");

    match action {
      Action::Employees => {
        let employees: Option<Vec<Employee>> = self
          .with_progress(out, self.api.fetch_with_cache(Endpoint::Employees, NO_PARAMS))
          .await?;
        match employees {
          Some(employees) => {
            for e in employees {
              writeln!(out, "{:<8} {} {}", e.id, e.first_name, e.last_name)?;
            }
          }
          None => self.report_error(out)?,
        }
      }
      Action::Transactions { page } => {
        let params = PaginatedRequestParams { page };
        let response: Option<PaginatedResponse<Vec<Transaction>>> = self
          .with_progress(
            out,
            self
              .api
              .fetch_with_cache(Endpoint::PaginatedTransactions, Some(&params)),
          )
          .await?;
        match response {
          Some(response) => {
            print_transactions(out, &response.data)?;
            match response.next_page {
              Some(next) => writeln!(out, "Next page: {}", next)?,
              None => writeln!(out, "No more pages")?,
            }
          }
          None => self.report_error(out)?,
        }
      }
      Action::EmployeeTransactions { employee_id } => {
        let params = RequestByEmployeeParams { employee_id };
        let transactions: Option<Vec<Transaction>> = self
          .with_progress(
            out,
            self
              .api
              .fetch_with_cache(Endpoint::TransactionsByEmployee, Some(&params)),
          )
          .await?;
        match transactions {
          Some(transactions) => print_transactions(out, &transactions)?,
          None => self.report_error(out)?,
        }
      }
      Action::Approve {
        transaction_id,
        value,
      } => {
        let params = SetTransactionApprovalParams {
          transaction_id,
          value,
        };
        let done: Option<()> = self
          .with_progress(
            out,
            self
              .api
              .fetch_without_cache(Endpoint::SetTransactionApproval, Some(&params)),
          )
          .await?;
        match done {
          Some(()) => {
            self.api.update_transaction_approval_cache(&params);
            let state = if value { "approved" } else { "pending" };
            writeln!(out, "{} is now {}", params.transaction_id, state)?;
          }
          None => self.report_error(out)?,
        }
      }
      Action::Invalidate(endpoints) => {
        self.api.clear_cache_by_endpoint(&endpoints);
        let names: Vec<&str> = endpoints.iter().map(Endpoint::as_str).collect();
        writeln!(out, "Invalidated: {}", names.join(", "))?;
      }
      Action::Clear => {
        self.api.clear_cache();
        writeln!(out, "Cache cleared")?;
      }
      Action::Keys => {
        let keys = self.context.cache.keys();
        if keys.is_empty() {
          writeln!(out, "(cache is empty)")?;
        }
        for key in keys {
          writeln!(out, "{}", key)?;
        }
      }
      Action::Help => {
        for cmd in COMMANDS {
          writeln!(out, "{:<40} {}", cmd.usage, cmd.description)?;
        }
        let endpoints: Vec<&str> = Endpoint::ALL.iter().map(Endpoint::as_str).collect();
        writeln!(out, "Endpoints: {}", endpoints.join(", "))?;
      }
      Action::Quit => self.should_quit = true,
    }

    Ok(())
  }

  /// Drive `request` to completion, printing a dot per tick while the
  /// tracker reports a request in flight.
  async fn with_progress<W, F>(&self, out: &mut W, request: F) -> Result<F::Output>
  where
    W: Write,
    F: Future,
  {
    tokio::pin!(request);
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    ticker.tick().await; // first tick completes immediately
    let mut dots = false;

    let output = loop {
      tokio::select! {
        output = &mut request => break output,
        _ = ticker.tick() => {
          if self.api.loading() {
            write!(out, ".")?;
            out.flush()?;
            dots = true;
          }
        }
      }
    };

    if dots {
      writeln!(out)?;
    }
    Ok(output)
  }

  fn report_error<W: Write>(&self, out: &mut W) -> Result<()> {
    let message = self
      .api
      .last_error()
      .unwrap_or_else(|| "Request failed".to_string());
    writeln!(out, "Error: {}", message)?;
    self.api.clear_error();
    Ok(())
  }
}

fn print_transactions<W: Write>(out: &mut W, transactions: &[Transaction]) -> Result<()> {
  if transactions.is_empty() {
    writeln!(out, "(no transactions)")?;
    return Ok(());
  }

  for t in transactions {
    let employee = format!("{} {}", t.employee.first_name, t.employee.last_name);
    writeln!(
      out,
      "{:<8} {:>10.2} {:<22} {:<16} {} {}",
      t.id,
      t.amount,
      t.merchant,
      employee,
      t.date,
      if t.approved { "approved" } else { "pending" }
    )?;
  }
  Ok(())
}
