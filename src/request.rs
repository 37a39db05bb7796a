//! Loading and error tracking for wrapped requests.
//!
//! Every data request goes through [`RequestTracker::wrapped_request`], which
//! raises a shared `loading` flag while the request runs and turns a failure
//! into `None` plus an error message callers can read afterwards.
//!
//! # Example
//!
//! ```ignore
//! let tracker = RequestTracker::new();
//! let employees = tracker
//!     .wrapped_request(|| async { backend.fetch(Endpoint::Employees, None).await })
//!     .await;
//!
//! if employees.is_none() {
//!     render_error(tracker.last_error());
//! }
//! ```

use color_eyre::Result;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::error;

#[derive(Debug, Default)]
struct TrackerState {
  loading: bool,
  error: Option<String>,
}

/// Shared loading flag and last error for a group of requests.
///
/// The flag is a single boolean, not a counter: when requests overlap, the
/// first one to finish clears it while the others are still in flight.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
  state: Arc<Mutex<TrackerState>>,
}

impl RequestTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether a wrapped request is currently running.
  pub fn loading(&self) -> bool {
    self.state().loading
  }

  /// Message of the most recent failure, until cleared.
  pub fn last_error(&self) -> Option<String> {
    self.state().error.clone()
  }

  pub fn clear_error(&self) {
    self.state().error = None;
  }

  /// Run `request` with the loading flag raised.
  ///
  /// Returns `None` if the request fails; the failure is logged and kept as
  /// the last error. A success leaves any earlier error in place.
  pub async fn wrapped_request<T, F, Fut>(&self, request: F) -> Option<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let _loading = LoadingGuard::enter(self);

    match request().await {
      Ok(data) => Some(data),
      Err(e) => {
        error!(error = %e, "request failed");
        self.state().error = Some(e.to_string());
        None
      }
    }
  }

  fn set_loading(&self, loading: bool) {
    self.state().loading = loading;
  }

  // State is two plain fields, so it is still usable after a poisoning panic.
  fn state(&self) -> MutexGuard<'_, TrackerState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Clears the loading flag on drop, so a cancelled request does not leave it raised.
struct LoadingGuard<'a> {
  tracker: &'a RequestTracker,
}

impl<'a> LoadingGuard<'a> {
  fn enter(tracker: &'a RequestTracker) -> Self {
    tracker.set_loading(true);
    Self { tracker }
  }
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    self.tracker.set_loading(false);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::{eyre::eyre, Report};
  use std::time::Duration;
  use tokio::sync::oneshot;

  #[tokio::test]
  async fn test_success_returns_data() {
    let tracker = RequestTracker::new();

    let data = tracker
      .wrapped_request(|| async { Ok::<_, Report>(vec![1, 2, 3]) })
      .await;

    assert_eq!(data, Some(vec![1, 2, 3]));
    assert!(!tracker.loading());
    assert_eq!(tracker.last_error(), None);
  }

  #[tokio::test]
  async fn test_loading_is_raised_while_running() {
    let tracker = RequestTracker::new();
    let observer = tracker.clone();

    let seen = tracker
      .wrapped_request(|| async move { Ok::<_, Report>(observer.loading()) })
      .await;

    assert_eq!(seen, Some(true));
    assert!(!tracker.loading());
  }

  #[tokio::test]
  async fn test_failure_becomes_none_with_error() {
    let tracker = RequestTracker::new();

    let data: Option<i32> = tracker
      .wrapped_request(|| async { Err(eyre!("Something went wrong")) })
      .await;

    assert_eq!(data, None);
    assert!(!tracker.loading());
    assert_eq!(tracker.last_error().as_deref(), Some("Something went wrong"));
  }

  #[tokio::test]
  async fn test_success_keeps_previous_error_until_cleared() {
    let tracker = RequestTracker::new();

    let _: Option<i32> = tracker.wrapped_request(|| async { Err(eyre!("boom")) }).await;
    let _ = tracker.wrapped_request(|| async { Ok::<_, Report>(1) }).await;
    assert_eq!(tracker.last_error().as_deref(), Some("boom"));

    tracker.clear_error();
    assert_eq!(tracker.last_error(), None);
  }

  #[tokio::test]
  async fn test_cancelled_request_clears_loading() {
    let tracker = RequestTracker::new();

    let result = tokio::time::timeout(
      Duration::from_millis(10),
      tracker.wrapped_request(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, Report>(42)
      }),
    )
    .await;

    assert!(result.is_err());
    assert!(!tracker.loading());
  }

  #[tokio::test]
  async fn test_overlapping_requests_share_one_flag() {
    let tracker = RequestTracker::new();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let slow = tracker.wrapped_request(|| async move {
      let _ = release_rx.await;
      Ok::<_, Report>(1)
    });
    let fast = async {
      let value = tracker.wrapped_request(|| async { Ok::<_, Report>(2) }).await;
      // The slow request is still pending, yet the flag is already down.
      let loading = tracker.loading();
      let _ = release_tx.send(());
      (value, loading)
    };

    let (slow_value, (fast_value, loading_after_fast)) = tokio::join!(slow, fast);

    assert_eq!(slow_value, Some(1));
    assert_eq!(fast_value, Some(2));
    assert!(!loading_after_fast);
    assert!(!tracker.loading());
  }
}
