use std::collections::HashMap;

use hawser_core::{Request, Result};

use super::Middleware;

/// Applies the service's default headers to every attempt.
///
/// Defaults are insert-only: a header the caller already set on the request
/// wins over the configured default with the same name.
#[derive(Debug, Clone, Default)]
pub struct HeaderMiddleware {
    defaults: HashMap<String, String>,
}

impl HeaderMiddleware {
    /// Build the middleware from the resolved default header map.
    #[must_use]
    pub fn new(defaults: HashMap<String, String>) -> Self {
        Self { defaults }
    }
}

impl Middleware for HeaderMiddleware {
    fn process_request(&self, request: &mut Request) -> Result<()> {
        for (name, value) in &self.defaults {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }
}
