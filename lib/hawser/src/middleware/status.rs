use hawser_core::{Error, Response, Result};

use super::Middleware;

/// Turns unacceptable status codes into [`Error::Status`].
///
/// With an empty whitelist any 2xx status is acceptable; a non-empty
/// whitelist replaces that rule entirely, so a whitelist of `[200]` rejects
/// a 201 and a whitelist of `[418]` accepts it.
#[derive(Debug, Clone, Default)]
pub struct StatusCodeMiddleware {
    whitelist: Vec<u16>,
}

impl StatusCodeMiddleware {
    /// Build the middleware from the resolved whitelist.
    #[must_use]
    pub fn new(whitelist: Vec<u16>) -> Self {
        Self { whitelist }
    }

    fn is_acceptable(&self, status: u16) -> bool {
        if self.whitelist.is_empty() {
            (200..300).contains(&status)
        } else {
            self.whitelist.contains(&status)
        }
    }
}

impl Middleware for StatusCodeMiddleware {
    fn process_response(&self, outcome: Result<Response>) -> Result<Response> {
        let response = outcome?;
        if self.is_acceptable(response.status()) {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().as_str().to_string();
            Err(Error::status(status, url, response.into_body()))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use url::Url;

    use super::*;

    fn response(status: u16) -> Response {
        Response::new(
            status,
            std::collections::HashMap::new(),
            "body".into(),
            Url::parse("https://example.org/a").expect("url"),
        )
    }

    #[test]
    fn default_rule_accepts_any_2xx() {
        let middleware = StatusCodeMiddleware::default();

        check!(middleware.process_response(Ok(response(200))).is_ok());
        check!(middleware.process_response(Ok(response(204))).is_ok());
    }

    #[test]
    fn default_rule_rejects_non_2xx_with_status_error() {
        let middleware = StatusCodeMiddleware::default();

        let err = middleware
            .process_response(Ok(response(404)))
            .expect_err("rejected");
        check!(err.status_code() == Some(404));
        check!(err.body().map(|b| &b[..]) == Some(&b"body"[..]));
        check!(err.to_string().contains("https://example.org/a"));
    }

    #[test]
    fn whitelist_replaces_the_2xx_rule() {
        let middleware = StatusCodeMiddleware::new(vec![200, 418]);

        check!(middleware.process_response(Ok(response(418))).is_ok());

        let err = middleware
            .process_response(Ok(response(201)))
            .expect_err("201 not whitelisted");
        check!(err.status_code() == Some(201));
    }

    #[test]
    fn transport_errors_pass_through() {
        let middleware = StatusCodeMiddleware::default();

        let err = middleware
            .process_response(Err(Error::connection("refused")))
            .expect_err("unchanged");
        check!(matches!(err, Error::Connection(_)));
    }
}
