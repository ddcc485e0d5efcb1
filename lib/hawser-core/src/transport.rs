//! The transport seam.

use std::future::Future;

use crate::{Request, Response, Result};

/// The pooled connection layer that performs the actual byte-level exchange.
///
/// The transport is a constructor-injected dependency of the client: the
/// production implementation wraps a pooled hyper client, and tests inject
/// scripted fakes to observe attempt counts and outcomes. Implementations
/// own per-attempt concerns such as the request timeout.
///
/// Implementations must be safe for unlimited concurrent callers.
pub trait Transport: Send + Sync {
    /// Send one request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns an error for connection failures, TLS failures, and timeouts.
    /// Status codes are not interpreted here; validation belongs to the
    /// middleware chain.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}
