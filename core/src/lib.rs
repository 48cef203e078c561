//! HTTP request dispatcher.
//!
//! # Overview
//! Turns a `RequestOptions` value (URL, method, headers, JSON body, query
//! parameters) into one HTTP exchange and returns the decoded JSON body, or
//! a `TransportError` when the exchange fails.
//!
//! ```no_run
//! # async fn run() -> Result<(), dispatch_core::TransportError> {
//! use dispatch_core::{Dispatcher, RequestOptions};
//!
//! let dispatcher = Dispatcher::new();
//! let latest = dispatcher
//!     .dispatch(
//!         &RequestOptions::get("http://localhost:3000/users")
//!             .param("_sort", "-id")
//!             .param("_start", 0)
//!             .param("_end", 1),
//!     )
//!     .await?;
//! # let _ = latest;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `Dispatcher::build_request` and `parse_response` are pure; the
//!   `Transport` trait is the only place I/O happens.
//! - `Dispatcher` carries no mutable state. It performs one transport call
//!   per dispatch; retries are layered on top with `RetryPolicy`.
//! - Sequence-valued params render as `key[0]=a&key[1]=b` by default
//!   (`ArrayFormat::Indexed`), configurable through `DispatcherConfig`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod graphql;
pub mod http;
pub mod options;
pub mod query;
pub mod retry;
pub mod transport;

pub use config::DispatcherConfig;
pub use dispatcher::{parse_response, Dispatcher};
pub use error::TransportError;
pub use graphql::GraphqlRequest;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::{ParamValue, RequestOptions};
pub use query::{render_query, ArrayFormat};
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport};

/// Dispatch `options` with a default `Dispatcher`.
///
/// Builds a new client per call; hold a `Dispatcher` to reuse connections.
pub async fn dispatch(options: &RequestOptions) -> Result<serde_json::Value, TransportError> {
    Dispatcher::new().dispatch(options).await
}
