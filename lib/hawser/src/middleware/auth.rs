use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use hawser_core::{Request, Result};

use super::Middleware;

const AUTHORIZATION: &str = "Authorization";

/// How the `Authorization` header is produced for a service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStrategy {
    /// No authentication header.
    #[default]
    None,
    /// `Authorization: Basic <base64(username:password)>`.
    Basic {
        /// Basic auth username.
        username: String,
        /// Basic auth password.
        password: String,
    },
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// The bearer token.
        token: String,
    },
    /// A literal, preformatted `Authorization` value.
    Custom {
        /// The full header value, sent verbatim.
        header: String,
    },
}

impl AuthStrategy {
    fn header_value(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Basic { username, password } => {
                let credentials = BASE64.encode(format!("{username}:{password}"));
                Some(format!("Basic {credentials}"))
            }
            Self::Bearer { token } => Some(format!("Bearer {token}")),
            Self::Custom { header } => Some(header.clone()),
        }
    }
}

/// Sets the `Authorization` header on every attempt.
///
/// The header is overwritten unconditionally: credentials come from the
/// service configuration, never from the caller.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    strategy: AuthStrategy,
}

impl AuthMiddleware {
    /// Build the middleware for one service's strategy.
    #[must_use]
    pub fn new(strategy: AuthStrategy) -> Self {
        Self { strategy }
    }
}

impl Middleware for AuthMiddleware {
    fn process_request(&self, request: &mut Request) -> Result<()> {
        if let Some(value) = self.strategy.header_value() {
            request
                .headers_mut()
                .insert(AUTHORIZATION.to_string(), value);
        }
        Ok(())
    }
}
