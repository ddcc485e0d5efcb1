//! Caller-owned registry of per-service clients.

use std::collections::HashMap;

use hawser_core::{Error, Result};

use crate::client::Client;
use crate::config::HttpClientConfig;

/// One [`Client`] per configured service, built eagerly at startup.
///
/// Building the registry resolves and validates every service up front, so a
/// bad base URL or unreadable TLS file fails the process at boot rather than
/// on the first request. The registry is plain owned data: share it behind
/// whatever the application already uses for its state.
#[derive(Debug)]
pub struct ServiceRegistry {
    clients: HashMap<String, Client>,
}

impl ServiceRegistry {
    /// Build a client for every service in the configuration.
    ///
    /// # Errors
    ///
    /// Fails with the first service whose configuration cannot be resolved
    /// or whose transport cannot be built.
    pub fn from_config(config: &HttpClientConfig) -> Result<Self> {
        let mut clients = HashMap::with_capacity(config.services.len());
        for name in config.services.keys() {
            let resolved = config.resolve(name)?;
            clients.insert(name.clone(), Client::new(resolved)?);
        }
        Ok(Self { clients })
    }

    /// Look up the client for a named service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] for a name the configuration does
    /// not define.
    pub fn get(&self, service: &str) -> Result<&Client> {
        self.clients
            .get(service)
            .ok_or_else(|| Error::unknown_service(service))
    }

    /// Names of all configured services, in no particular order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }
}
