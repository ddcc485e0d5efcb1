use tracing::{debug, warn};

use hawser_core::{Request, Response, Result};

use super::Middleware;

/// Emits a tracing record per attempt, gated by the service's log toggles.
///
/// Transport errors are not logged here - they carry their own context and
/// the retry loop in the client reports them.
#[derive(Debug, Clone)]
pub struct LogMiddleware {
    service: String,
    log_requests: bool,
    log_responses: bool,
}

impl LogMiddleware {
    /// Build the middleware for one service.
    #[must_use]
    pub fn new(service: impl Into<String>, log_requests: bool, log_responses: bool) -> Self {
        Self {
            service: service.into(),
            log_requests,
            log_responses,
        }
    }
}

impl Middleware for LogMiddleware {
    fn process_request(&self, request: &mut Request) -> Result<()> {
        if self.log_requests {
            let body = request
                .body()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            debug!(
                service = %self.service,
                method = %request.method(),
                url = %request.url(),
                headers = ?request.headers(),
                body = %body,
                "sending request"
            );
        }
        Ok(())
    }

    fn process_response(&self, outcome: Result<Response>) -> Result<Response> {
        if self.log_responses {
            if let Ok(response) = &outcome {
                if response.status() >= 400 {
                    warn!(
                        service = %self.service,
                        status = response.status(),
                        url = %response.url(),
                        body_len = response.body().len(),
                        "received error response"
                    );
                } else {
                    debug!(
                        service = %self.service,
                        status = response.status(),
                        url = %response.url(),
                        body_len = response.body().len(),
                        "received response"
                    );
                }
            }
        }
        outcome
    }
}
