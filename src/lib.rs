//! Request cache over an asynchronous transport.
//!
//! [`cache::RequestCache`] memoizes backend responses under keys derived from
//! the endpoint and its parameters, and keeps cached transaction listings in
//! step with approval changes. [`api::MockBackend`] is an in-memory backend
//! with simulated latency used by the interactive session in [`app`].

pub mod api;
pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod request;
