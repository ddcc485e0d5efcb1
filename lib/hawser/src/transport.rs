//! The pooled hyper transport.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::Uri;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;

use hawser_core::{Error, Request, Response, Result, Transport};

use crate::config::ResolvedConfig;
use crate::connector::{self, ProxyConnector};

/// [`Transport`] backed by a pooled hyper client.
///
/// One instance per [`Client`](crate::Client); connections are pooled and
/// reused across requests, and the whole transport is dropped with the
/// client, closing its idle connections.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: LegacyClient<HttpsConnector<ProxyConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl HyperTransport {
    /// Build the transport for one resolved service configuration.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] when the TLS material or proxy URL in
    /// the configuration cannot be used.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let connector = connector::https_connector(
            &config.tls,
            config.proxy_url.as_ref(),
            config.connect_timeout,
        )?;

        let client = LegacyClient::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build(connector);

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    async fn dispatch(&self, request: Request) -> Result<Response> {
        let (method, url, headers, body) = request.into_parts();

        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|e| Error::invalid_request(format!("invalid URI '{url}': {e}")))?;

        let mut builder = http::Request::builder().method(http::Method::from(method)).uri(uri);
        for (name, value) in &headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::invalid_request(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::invalid_request(format!("invalid header value: {e}")))?;
            builder = builder.header(name, value);
        }
        let http_request = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        // One timeout budget for the whole exchange: a server that returns
        // headers and then stalls the body still fails the attempt.
        let exchange = async {
            let response = self
                .client
                .request(http_request)
                .await
                .map_err(map_transport_error)?;

            let status = response.status().as_u16();
            let headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(format!("reading response body: {e}")))?
                .to_bytes();

            Ok::<_, Error>((status, headers, body))
        };

        let (status, response_headers, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)??;

        Ok(Response::new(status, response_headers, body, url))
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        self.dispatch(request)
    }
}

/// Classify a hyper connection failure into the crate's error taxonomy.
fn map_transport_error(error: hyper_util::client::legacy::Error) -> Error {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    classify_failure(message)
}

fn classify_failure(message: String) -> Error {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("tls")
        || lowered.contains("ssl")
        || lowered.contains("certificate")
        || lowered.contains("handshake")
    {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}
