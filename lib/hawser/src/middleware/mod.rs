//! Request/response middleware.
//!
//! A middleware sees every attempt twice: once on the way out, where it may
//! rewrite the [`Request`] or abort the attempt, and once on the way back,
//! where it may inspect, replace, or fail the outcome. The client runs the
//! request phase in registration order and the response phase in reverse, so
//! the first-registered middleware is both the first to touch the request
//! and the last to see the response.
//!
//! Both phases run again on every retry attempt.

mod auth;
mod headers;
mod logging;
mod status;

pub use self::auth::{AuthMiddleware, AuthStrategy};
pub use self::headers::HeaderMiddleware;
pub use self::logging::LogMiddleware;
pub use self::status::StatusCodeMiddleware;

use hawser_core::{Request, Response, Result};

/// A processing stage wrapped around every request attempt.
pub trait Middleware: Send + Sync {
    /// Called before the transport sends the request.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the attempt without sending anything.
    fn process_request(&self, request: &mut Request) -> Result<()> {
        let _ = request;
        Ok(())
    }

    /// Called with the attempt outcome, successful or not.
    ///
    /// The default implementation passes the outcome through untouched.
    ///
    /// # Errors
    ///
    /// A middleware may turn a successful response into an error (status
    /// validation does this) or recover from one.
    fn process_response(&self, outcome: Result<Response>) -> Result<Response> {
        outcome
    }
}
