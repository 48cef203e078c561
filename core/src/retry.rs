//! Caller-side retry wrapper.
//!
//! `Dispatcher::dispatch` performs exactly one transport call. Callers that
//! want another attempt on failure wrap the call in a `RetryPolicy`:
//!
//! ```no_run
//! # async fn run() -> Result<(), dispatch_core::TransportError> {
//! use dispatch_core::{Dispatcher, RequestOptions, RetryPolicy};
//!
//! let dispatcher = Dispatcher::new();
//! let options = RequestOptions::get("http://localhost:3000/users");
//! let users = RetryPolicy::default().run(|| dispatcher.dispatch(&options)).await?;
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;

use tracing::warn;

use crate::error::TransportError;

/// Retries a failing operation up to `retries` extra times.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    retries: u32,
    retry_if: fn(&TransportError) -> bool,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy").field("retries", &self.retries).finish()
    }
}

fn always(_: &TransportError) -> bool {
    true
}

impl Default for RetryPolicy {
    /// One retry on any error.
    fn default() -> Self {
        Self::new(1)
    }
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            retry_if: always,
        }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Only retry errors for which `predicate` returns true.
    pub fn retry_if(mut self, predicate: fn(&TransportError) -> bool) -> Self {
        self.retry_if = predicate;
        self
    }

    /// Run `operation`, retrying on error. The last error is returned.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries && (self.retry_if)(&err) => {
                    attempt += 1;
                    warn!(attempt, retries = self.retries, error = %err, "retrying request");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Server-side failures (5xx) and network faults; 4xx is the caller's fault.
pub fn is_transient(err: &TransportError) -> bool {
    match err {
        TransportError::Network(_) => true,
        TransportError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}
