//! Transactions API: domain types, endpoints and the transport seam.

mod endpoint;
mod mock;
mod transport;
pub mod types;

pub use endpoint::Endpoint;
pub use mock::MockBackend;
pub use transport::Transport;
