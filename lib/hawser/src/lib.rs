//! Outbound HTTP client for named upstream services.
//!
//! Each upstream gets its own [`Client`], resolved from a
//! [`HttpClientConfig`] block: base URL, timeout, retry policy,
//! authentication, default headers, TLS and proxy options. Requests run
//! through a middleware chain (logging, default headers, status validation,
//! authentication) around a pooled hyper transport, with fixed-delay retries
//! for transient failures.
//!
//! # Example
//!
//! ```ignore
//! use hawser::{HttpClientConfig, ServiceRegistry};
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct Article {
//!     id: u64,
//!     title: String,
//! }
//!
//! let config: HttpClientConfig = serde_json::from_str(raw_config)?;
//! let registry = ServiceRegistry::from_config(&config)?;
//!
//! let kb = registry.get("knowledge-base")?;
//! let article: Article = kb.get_json("/v1/articles/42").await?;
//! ```

mod client;
mod config;
mod connector;
pub mod middleware;
mod registry;
mod retry;
mod transport;

// Re-export client types
pub use client::Client;
pub use config::{AuthKind, HttpClientConfig, ResolvedConfig, ServiceConfig, TlsOptions};
pub use registry::ServiceRegistry;
pub use retry::RetryPolicy;
pub use transport::HyperTransport;

// Re-export core types
pub use hawser_core::{
    Body, ByteStream, Error, Method, Request, RequestBuilder, Response, Result, Transport,
    from_json, to_json,
};
