//! Client configuration: per-service overrides merged over process defaults.
//!
//! [`HttpClientConfig`] is the process-wide block the host application
//! deserializes from its own configuration source (YAML, JSON, TOML - this
//! crate does not own file loading). It carries global defaults plus a map of
//! named [`ServiceConfig`] overrides. [`HttpClientConfig::resolve`] merges
//! one service over the defaults into the [`ResolvedConfig`] a
//! [`Client`](crate::Client) is built from.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use hawser_core::{Error, Result};

use crate::middleware::AuthStrategy;

const DEFAULT_TIMEOUT_SECS: i64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_DELAY_SECS: i64 = 1;
const DEFAULT_POOL_IDLE_PER_HOST: usize = 32;
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Authentication mode for one upstream service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// No authentication.
    #[default]
    None,
    /// HTTP basic authentication from a username/password pair.
    Basic,
    /// Bearer token authentication.
    Bearer,
    /// A literal `Authorization` header value.
    Custom,
}

/// Static configuration for one named upstream service.
///
/// Every field is an override: unset (or zero/negative for the numeric
/// fields) means "inherit the global default".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL all relative request paths are joined onto.
    pub base_url: Option<String>,
    /// Request timeout in seconds; zero or negative inherits the default.
    pub timeout: Option<i64>,
    /// Maximum retry count; zero or negative inherits the default.
    pub max_retries: Option<i64>,
    /// Fixed delay between retries in seconds; zero or negative inherits.
    pub retry_delay: Option<i64>,
    /// Authentication mode.
    pub auth_type: AuthKind,
    /// Basic auth username.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Bearer auth token.
    pub token: String,
    /// Literal `Authorization` value for [`AuthKind::Custom`].
    pub auth_header: String,
    /// Extra request headers, merged over the global header map.
    pub headers: HashMap<String, String>,
    /// Acceptable status codes; empty means "any 2xx".
    pub valid_status_codes: Vec<u16>,
    /// Skip TLS certificate verification for this service.
    pub insecure_skip_verify: Option<bool>,
    /// Client certificate file (PEM).
    pub cert_file: Option<PathBuf>,
    /// Client private key file (PEM).
    pub key_file: Option<PathBuf>,
    /// Additional CA bundle file (PEM).
    pub ca_file: Option<PathBuf>,
}

/// Process-wide defaults plus the named-service map.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Default request timeout in seconds.
    pub timeout: i64,
    /// Default maximum retry count.
    pub max_retries: i64,
    /// Default fixed delay between retries in seconds.
    pub retry_delay: i64,
    /// Emit a debug log record for each outgoing request.
    pub enable_request_log: bool,
    /// Emit a log record for each received response.
    pub enable_response_log: bool,
    /// Default request headers applied to every service.
    pub headers: HashMap<String, String>,
    /// Default acceptable status codes; empty means "any 2xx".
    pub valid_status_codes: Vec<u16>,
    /// HTTP proxy to tunnel through, if any.
    pub proxy_url: Option<String>,
    /// Skip TLS certificate verification by default.
    pub insecure_skip_verify: bool,
    /// Default client certificate file (PEM).
    pub cert_file: Option<PathBuf>,
    /// Default client private key file (PEM).
    pub key_file: Option<PathBuf>,
    /// Default additional CA bundle file (PEM).
    pub ca_file: Option<PathBuf>,
    /// TCP connect timeout in seconds.
    pub connect_timeout: u64,
    /// Maximum idle pooled connections per host.
    pub pool_idle_per_host: usize,
    /// Idle pooled connection timeout in seconds.
    pub pool_idle_timeout: u64,
    /// Named upstream services.
    pub services: HashMap<String, ServiceConfig>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            enable_request_log: false,
            enable_response_log: false,
            headers: HashMap::new(),
            valid_status_codes: Vec::new(),
            proxy_url: None,
            insecure_skip_verify: false,
            cert_file: None,
            key_file: None,
            ca_file: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            pool_idle_per_host: DEFAULT_POOL_IDLE_PER_HOST,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT_SECS,
            services: HashMap::new(),
        }
    }
}

/// TLS options for one client's transport.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Skip certificate verification. Testing environments only.
    pub insecure_skip_verify: bool,
    /// Additional CA bundle file (PEM) appended to the webpki roots.
    pub ca_file: Option<PathBuf>,
    /// Client certificate file (PEM).
    pub cert_file: Option<PathBuf>,
    /// Client private key file (PEM).
    pub key_file: Option<PathBuf>,
}

/// The effective configuration owned by one [`Client`](crate::Client).
///
/// Produced by [`HttpClientConfig::resolve`]; immutable for the client's
/// lifetime and shared read-only across all of its requests.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The service name this configuration was resolved for.
    pub service: String,
    /// Base URL relative request paths are joined onto.
    pub base_url: Option<Url>,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Fixed delay slept between attempts.
    pub retry_delay: Duration,
    /// Authentication strategy, fixed at construction.
    pub auth: AuthStrategy,
    /// Service-level default headers.
    pub headers: HashMap<String, String>,
    /// Acceptable status codes; empty means "any 2xx".
    pub valid_status_codes: Vec<u16>,
    /// Emit a debug log record for each outgoing request.
    pub enable_request_log: bool,
    /// Emit a log record for each received response.
    pub enable_response_log: bool,
    /// HTTP proxy to tunnel through, if any.
    pub proxy_url: Option<Url>,
    /// TLS options for the transport.
    pub tls: TlsOptions,
    /// Maximum idle pooled connections per host.
    pub pool_idle_per_host: usize,
    /// Idle pooled connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS.unsigned_abs()),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_retries: 0,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS.unsigned_abs()),
            auth: AuthStrategy::None,
            headers: HashMap::new(),
            valid_status_codes: Vec::new(),
            enable_request_log: false,
            enable_response_log: false,
            proxy_url: None,
            tls: TlsOptions::default(),
            pool_idle_per_host: DEFAULT_POOL_IDLE_PER_HOST,
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
        }
    }
}

/// A zero-or-negative override inherits the default.
fn inherit(value: Option<i64>, default: i64) -> i64 {
    match value {
        Some(v) if v > 0 => v,
        _ => default,
    }
}

fn secs(value: i64, fallback: i64) -> Duration {
    let v = if value > 0 { value } else { fallback };
    Duration::from_secs(v.unsigned_abs())
}

impl HttpClientConfig {
    /// Resolve the effective configuration for one named service.
    ///
    /// The merge is field-local: a set (non-zero, non-empty) service value
    /// wins, everything else inherits the global default. Header maps merge
    /// rather than replace, with service keys winning on conflict.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] for a name with no entry, and
    /// [`Error::Config`] for malformed base or proxy URLs - both at
    /// construction time, never at request time.
    pub fn resolve(&self, service: &str) -> Result<ResolvedConfig> {
        let svc = self
            .services
            .get(service)
            .ok_or_else(|| Error::unknown_service(service))?;

        let base_url = match svc.base_url.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(Url::parse(raw).map_err(|e| {
                Error::config(format!("invalid base URL for service '{service}': {e}"))
            })?),
        };

        let proxy_url = match self.proxy_url.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                Url::parse(raw).map_err(|e| Error::config(format!("invalid proxy URL: {e}")))?,
            ),
        };

        let mut headers = self.headers.clone();
        headers.extend(svc.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let valid_status_codes = if svc.valid_status_codes.is_empty() {
            self.valid_status_codes.clone()
        } else {
            svc.valid_status_codes.clone()
        };

        let auth = match svc.auth_type {
            AuthKind::None => AuthStrategy::None,
            AuthKind::Basic => AuthStrategy::Basic {
                username: svc.username.clone(),
                password: svc.password.clone(),
            },
            AuthKind::Bearer => AuthStrategy::Bearer {
                token: svc.token.clone(),
            },
            AuthKind::Custom => AuthStrategy::Custom {
                header: svc.auth_header.clone(),
            },
        };

        let max_retries = inherit(svc.max_retries, self.max_retries).max(0);

        Ok(ResolvedConfig {
            service: service.to_string(),
            base_url,
            timeout: secs(inherit(svc.timeout, self.timeout), DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            max_retries: u32::try_from(max_retries).unwrap_or(u32::MAX),
            retry_delay: secs(
                inherit(svc.retry_delay, self.retry_delay),
                DEFAULT_RETRY_DELAY_SECS,
            ),
            auth,
            headers,
            valid_status_codes,
            enable_request_log: self.enable_request_log,
            enable_response_log: self.enable_response_log,
            proxy_url,
            tls: TlsOptions {
                insecure_skip_verify: svc
                    .insecure_skip_verify
                    .unwrap_or(self.insecure_skip_verify),
                ca_file: svc.ca_file.clone().or_else(|| self.ca_file.clone()),
                cert_file: svc.cert_file.clone().or_else(|| self.cert_file.clone()),
                key_file: svc.key_file.clone().or_else(|| self.key_file.clone()),
            },
            pool_idle_per_host: self.pool_idle_per_host,
            pool_idle_timeout: Duration::from_secs(self.pool_idle_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from_json(value: serde_json::Value) -> HttpClientConfig {
        serde_json::from_value(value).expect("valid config")
    }

    #[test]
    fn unknown_service_fails_fast() {
        let config = HttpClientConfig::default();
        let err = config.resolve("billing").expect_err("unknown service");
        assert!(matches!(err, Error::UnknownService { .. }));
        assert_eq!(err.to_string(), "unknown service: billing");
    }

    #[test]
    fn unset_fields_inherit_defaults() {
        let config = config_from_json(serde_json::json!({
            "timeout": 20,
            "max_retries": 4,
            "retry_delay": 2,
            "services": { "kb": { "base_url": "https://kb.internal" } }
        }));

        let resolved = config.resolve("kb").expect("resolved");
        assert_eq!(resolved.timeout, Duration::from_secs(20));
        assert_eq!(resolved.max_retries, 4);
        assert_eq!(resolved.retry_delay, Duration::from_secs(2));
        assert_eq!(
            resolved.base_url.as_ref().map(Url::as_str),
            Some("https://kb.internal/")
        );
        assert_eq!(resolved.auth, AuthStrategy::None);
    }

    #[test]
    fn set_fields_override_defaults() {
        let config = config_from_json(serde_json::json!({
            "timeout": 20,
            "max_retries": 4,
            "services": { "kb": { "timeout": 5, "max_retries": 1 } }
        }));

        let resolved = config.resolve("kb").expect("resolved");
        assert_eq!(resolved.timeout, Duration::from_secs(5));
        assert_eq!(resolved.max_retries, 1);
    }

    #[test]
    fn zero_and_negative_overrides_inherit() {
        let config = config_from_json(serde_json::json!({
            "timeout": 20,
            "max_retries": 4,
            "services": { "kb": { "timeout": 0, "max_retries": -1 } }
        }));

        let resolved = config.resolve("kb").expect("resolved");
        assert_eq!(resolved.timeout, Duration::from_secs(20));
        assert_eq!(resolved.max_retries, 4);
    }

    #[test]
    fn header_maps_merge_with_service_keys_winning() {
        let config = config_from_json(serde_json::json!({
            "headers": { "X-Env": "prod", "Accept": "application/json" },
            "services": { "kb": { "headers": { "X-Env": "staging", "X-Team": "kb" } } }
        }));

        let resolved = config.resolve("kb").expect("resolved");
        assert_eq!(resolved.headers.get("X-Env").map(String::as_str), Some("staging"));
        assert_eq!(
            resolved.headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(resolved.headers.get("X-Team").map(String::as_str), Some("kb"));
    }

    #[test]
    fn auth_strategy_is_built_from_service_fields() {
        let config = config_from_json(serde_json::json!({
            "services": {
                "a": { "auth_type": "basic", "username": "u", "password": "p" },
                "b": { "auth_type": "bearer", "token": "abc" },
                "c": { "auth_type": "custom", "auth_header": "Signature v1" }
            }
        }));

        assert_eq!(
            config.resolve("a").expect("a").auth,
            AuthStrategy::Basic {
                username: "u".to_string(),
                password: "p".to_string()
            }
        );
        assert_eq!(
            config.resolve("b").expect("b").auth,
            AuthStrategy::Bearer {
                token: "abc".to_string()
            }
        );
        assert_eq!(
            config.resolve("c").expect("c").auth,
            AuthStrategy::Custom {
                header: "Signature v1".to_string()
            }
        );
    }

    #[test]
    fn malformed_base_url_is_a_config_error() {
        let config = config_from_json(serde_json::json!({
            "services": { "kb": { "base_url": "::not a url::" } }
        }));

        let err = config.resolve("kb").expect_err("malformed URL");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_proxy_url_is_a_config_error() {
        let config = config_from_json(serde_json::json!({
            "proxy_url": "::not a url::",
            "services": { "kb": {} }
        }));

        let err = config.resolve("kb").expect_err("malformed proxy");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn status_whitelist_prefers_service_values() {
        let config = config_from_json(serde_json::json!({
            "valid_status_codes": [200],
            "services": {
                "a": { "valid_status_codes": [200, 201] },
                "b": {}
            }
        }));

        assert_eq!(config.resolve("a").expect("a").valid_status_codes, vec![200, 201]);
        assert_eq!(config.resolve("b").expect("b").valid_status_codes, vec![200]);
    }

    #[test]
    fn tls_options_fall_back_per_field() {
        let config = config_from_json(serde_json::json!({
            "insecure_skip_verify": true,
            "ca_file": "/etc/ssl/internal-ca.pem",
            "services": {
                "kb": { "insecure_skip_verify": false }
            }
        }));

        let resolved = config.resolve("kb").expect("resolved");
        assert!(!resolved.tls.insecure_skip_verify);
        assert_eq!(
            resolved.tls.ca_file.as_deref(),
            Some(std::path::Path::new("/etc/ssl/internal-ca.pem"))
        );
    }
}
