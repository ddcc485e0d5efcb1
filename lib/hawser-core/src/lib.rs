//! Core types for the hawser upstream HTTP client.
//!
//! This crate provides the foundational types used by hawser:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - buffered HTTP request types
//! - [`Response`] - buffered HTTP response type
//! - [`Body`] - request payload descriptor, replayable across retries
//! - [`Error`] and [`Result`] - error handling
//! - [`Transport`] - the injectable send seam
//! - [`to_json`] / [`from_json`] - JSON codec helpers

mod body;
mod error;
mod method;
mod request;
mod response;
mod transport;

pub use body::{Body, ByteStream, from_json, to_json};
pub use error::{Error, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::Transport;
