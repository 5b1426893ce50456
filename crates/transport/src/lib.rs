//! HTTP transport used by the IronBox client.
//!
//! The client crates only talk to the [`Transport`] trait. [`HttpTransport`]
//! implements it on top of `reqwest`; tests substitute in-memory mocks.

mod config;
mod error;
mod http;
mod request;

pub use config::{BasicAuth, RequestConfig};
pub use error::TransportError;
pub use http::HttpTransport;
pub use request::{Method, Request, RequestBody, Response, body_excerpt};

use std::future::Future;
use std::pin::Pin;

/// Future returned by [`Transport::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>>;

/// Abstract HTTP transport.
///
/// Implementations send one request and return the status and body of the
/// answer. Non-success statuses are *not* errors at this layer; callers
/// inspect [`Response::status`] themselves.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> SendFuture<'_>;
}
