//! The per-service HTTP client.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use hawser_core::{Body, Error, Method, Request, Response, Result, Transport};

use crate::config::ResolvedConfig;
use crate::middleware::{
    AuthMiddleware, AuthStrategy, HeaderMiddleware, LogMiddleware, Middleware,
    StatusCodeMiddleware,
};
use crate::retry::RetryPolicy;
use crate::transport::HyperTransport;

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// HTTP client bound to one named upstream service.
///
/// Construction resolves everything that can fail early - base URL, TLS
/// material, proxy address - so calls only fail for request-scoped reasons.
/// The client is cheap to clone and safe to share across tasks; clones share
/// the underlying connection pool.
///
/// Every attempt runs the middleware chain: request phase in registration
/// order, response phase in reverse. Retries re-run both phases.
#[derive(Clone)]
pub struct Client<T: Transport = HyperTransport> {
    config: Arc<ResolvedConfig>,
    transport: T,
    middlewares: Vec<Arc<dyn Middleware>>,
    retry: RetryPolicy,
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("service", &self.config.service)
            .field("config", &self.config)
            .field("middlewares", &self.middlewares.len())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Client<HyperTransport> {
    /// Build a client over the pooled hyper transport.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] when the TLS material or proxy URL in
    /// the configuration cannot be used.
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let transport = HyperTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Client<T> {
    /// Build a client over a custom transport.
    ///
    /// The default middleware chain is installed in registration order:
    /// logging, default headers, status validation, then authentication when
    /// the service configures any.
    pub fn with_transport(config: ResolvedConfig, transport: T) -> Self {
        let mut middlewares: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(LogMiddleware::new(
                config.service.clone(),
                config.enable_request_log,
                config.enable_response_log,
            )),
            Arc::new(HeaderMiddleware::new(config.headers.clone())),
            Arc::new(StatusCodeMiddleware::new(config.valid_status_codes.clone())),
        ];
        if config.auth != AuthStrategy::None {
            middlewares.push(Arc::new(AuthMiddleware::new(config.auth.clone())));
        }
        let retry = RetryPolicy::new(config.max_retries, config.retry_delay);

        Self {
            config: Arc::new(config),
            transport,
            middlewares,
            retry,
        }
    }

    /// Append a custom middleware after the default chain.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// The service name this client was resolved for.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.config.service
    }

    /// Send a request, retrying transient failures per the service's policy.
    ///
    /// `path` is joined onto the service base URL unless it is already
    /// absolute. The body is materialized once per attempt; a stream body
    /// can only back a single attempt and fails the retry instead of
    /// silently sending an empty payload.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error as-is. When at least one retry
    /// was performed, the final error is wrapped in
    /// [`Error::RetryExhausted`]; its status and body accessors delegate to
    /// the wrapped error. [`Error::NonRetryableBody`] is never wrapped so
    /// callers can match on it directly.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: HashMap<String, String>,
        mut body: Body,
    ) -> Result<Response> {
        let url = self.resolve_url(path)?;
        let mut attempt: u32 = 0;

        loop {
            let outcome = self.attempt(method, &url, &headers, &mut body).await;

            if self.retry.should_retry(attempt, &outcome) {
                attempt += 1;
                debug!(
                    service = %self.config.service,
                    url = %url,
                    attempt,
                    max_retries = self.retry.max_retries(),
                    "retrying request"
                );
                tokio::time::sleep(self.retry.delay()).await;
                continue;
            }

            return match outcome {
                Ok(response) => Ok(response),
                // A consumed stream body keeps its distinct error so callers
                // can match on it directly.
                Err(error @ Error::NonRetryableBody) => Err(error),
                Err(error) if attempt > 0 => Err(Error::retry_exhausted(attempt, error)),
                Err(error) => Err(error),
            };
        }
    }

    /// One attempt: materialize the body, run the request phase, send, then
    /// run the response phase in reverse order.
    async fn attempt(
        &self,
        method: Method,
        url: &Url,
        headers: &HashMap<String, String>,
        body: &mut Body,
    ) -> Result<Response> {
        let outcome = self.dispatch(method, url, headers, body).await;
        self.middlewares
            .iter()
            .rev()
            .fold(outcome, |acc, middleware| middleware.process_response(acc))
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &Url,
        headers: &HashMap<String, String>,
        body: &mut Body,
    ) -> Result<Response> {
        let payload = body.materialize().await?;

        let mut builder = Request::builder(method, url.clone())
            .headers(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        if body.is_json() && !headers.contains_key(CONTENT_TYPE) {
            builder = builder.header(CONTENT_TYPE, APPLICATION_JSON);
        }
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }
        let mut request = builder.build();

        for middleware in &self.middlewares {
            middleware.process_request(&mut request)?;
        }

        self.transport.send(request).await
    }

    /// Join a request path onto the service base URL.
    ///
    /// An absolute `http://` or `https://` path is used as-is; anything else
    /// requires a configured base URL.
    fn resolve_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.config.base_url.as_ref().ok_or_else(|| {
            Error::config(format!(
                "service '{}' has no base URL for relative path '{path}'",
                self.config.service
            ))
        })?;

        let base = base.as_str().trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Ok(Url::parse(&joined)?)
    }

    /// GET `path` and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// A non-2xx response fails with [`Error::Status`] even if a custom
    /// whitelist accepted it, and a body that does not match `R` fails with
    /// [`Error::JsonDeserialization`].
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.get_json_with_headers(path, HashMap::new()).await
    }

    /// GET `path` with extra per-call headers and decode the JSON response
    /// body.
    ///
    /// # Errors
    ///
    /// See [`Client::get_json`].
    pub async fn get_json_with_headers<R: DeserializeOwned>(
        &self,
        path: &str,
        headers: HashMap<String, String>,
    ) -> Result<R> {
        let response = self
            .request(Method::Get, path, headers, Body::empty())
            .await?;
        decode_json(&response)
    }

    /// POST `payload` as JSON to `path` and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Client::get_json`]; serialization failures surface as
    /// [`Error::JsonSerialization`].
    pub async fn post_json<B, R>(&self, path: &str, payload: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post_json_with_headers(path, HashMap::new(), payload)
            .await
    }

    /// POST `payload` as JSON with extra per-call headers and decode the
    /// JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Client::post_json`].
    pub async fn post_json_with_headers<B, R>(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        payload: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(Method::Post, path, headers, Body::json(payload)?)
            .await?;
        decode_json(&response)
    }

    /// PUT `payload` as JSON to `path` and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Client::post_json`].
    pub async fn put_json<B, R>(&self, path: &str, payload: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(Method::Put, path, HashMap::new(), Body::json(payload)?)
            .await?;
        decode_json(&response)
    }

    /// PUT `payload` as JSON with extra per-call headers and decode the JSON
    /// response body.
    ///
    /// # Errors
    ///
    /// See [`Client::post_json`].
    pub async fn put_json_with_headers<B, R>(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        payload: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(Method::Put, path, headers, Body::json(payload)?)
            .await?;
        decode_json(&response)
    }

    /// PATCH `payload` as JSON to `path` and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Client::post_json`].
    pub async fn patch_json<B, R>(&self, path: &str, payload: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(Method::Patch, path, HashMap::new(), Body::json(payload)?)
            .await?;
        decode_json(&response)
    }

    /// PATCH `payload` as JSON with extra per-call headers and decode the
    /// JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Client::post_json`].
    pub async fn patch_json_with_headers<B, R>(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        payload: &B,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(Method::Patch, path, headers, Body::json(payload)?)
            .await?;
        decode_json(&response)
    }

    /// DELETE `path` and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Client::get_json`].
    pub async fn delete_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let response = self
            .request(Method::Delete, path, HashMap::new(), Body::empty())
            .await?;
        decode_json(&response)
    }

    /// DELETE `path` with extra per-call headers and decode the JSON
    /// response body.
    ///
    /// # Errors
    ///
    /// See [`Client::get_json`].
    pub async fn delete_json_with_headers<R: DeserializeOwned>(
        &self,
        path: &str,
        headers: HashMap<String, String>,
    ) -> Result<R> {
        let response = self
            .request(Method::Delete, path, headers, Body::empty())
            .await?;
        decode_json(&response)
    }

    /// GET `path` and return the raw response.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::Get, path, HashMap::new(), Body::empty())
            .await
    }

    /// GET `path` with extra per-call headers.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn get_with_headers(
        &self,
        path: &str,
        headers: HashMap<String, String>,
    ) -> Result<Response> {
        self.request(Method::Get, path, headers, Body::empty()).await
    }

    /// POST `body` to `path` and return the raw response.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn post(&self, path: &str, body: Body) -> Result<Response> {
        self.request(Method::Post, path, HashMap::new(), body).await
    }

    /// POST `body` to `path` with extra per-call headers.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn post_with_headers(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        body: Body,
    ) -> Result<Response> {
        self.request(Method::Post, path, headers, body).await
    }

    /// PUT `body` to `path` and return the raw response.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn put(&self, path: &str, body: Body) -> Result<Response> {
        self.request(Method::Put, path, HashMap::new(), body).await
    }

    /// PUT `body` to `path` with extra per-call headers.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn put_with_headers(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        body: Body,
    ) -> Result<Response> {
        self.request(Method::Put, path, headers, body).await
    }

    /// PATCH `body` to `path` and return the raw response.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn patch(&self, path: &str, body: Body) -> Result<Response> {
        self.request(Method::Patch, path, HashMap::new(), body).await
    }

    /// PATCH `body` to `path` with extra per-call headers.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn patch_with_headers(
        &self,
        path: &str,
        headers: HashMap<String, String>,
        body: Body,
    ) -> Result<Response> {
        self.request(Method::Patch, path, headers, body).await
    }

    /// DELETE `path` and return the raw response.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.request(Method::Delete, path, HashMap::new(), Body::empty())
            .await
    }

    /// DELETE `path` with extra per-call headers.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn delete_with_headers(
        &self,
        path: &str,
        headers: HashMap<String, String>,
    ) -> Result<Response> {
        self.request(Method::Delete, path, headers, Body::empty())
            .await
    }
}

/// The JSON helpers validate the status themselves so they keep working
/// when a custom whitelist lets non-2xx responses through the middleware.
fn decode_json<R: DeserializeOwned>(response: &Response) -> Result<R> {
    if !response.is_success() {
        return Err(Error::status(
            response.status(),
            response.url().as_str(),
            response.body().clone(),
        ));
    }
    response.json()
}
