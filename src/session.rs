//! Shared HTTP session.
//!
//! One `reqwest::Client` with an in-memory cookie jar carries the whole
//! workflow: identity-provider login, the SSO handshake, and the document
//! download all ride on the same cookies. The session is built once and
//! shared as `Arc<HttpSession>` by every service; [`crate::Scraper`]
//! rejects services holding a different session at construction.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::headers;

/// A cookie-bearing HTTP session plus the endpoint table it talks to.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    endpoints: Endpoints,
}

impl HttpSession {
    /// Start building a session with default SAT endpoints and timeouts.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The endpoint table this session targets.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

/// Builder for [`HttpSession`].
///
/// Defaults mirror what the portal tolerates: 30s request timeout, 10s
/// connect timeout, at most 10 followed redirects, TLS verification on.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    endpoints: Endpoints,
    timeout: Duration,
    connect_timeout: Duration,
    max_redirects: usize,
    verify_tls: bool,
    user_agent: String,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::new(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            verify_tls: true,
            user_agent: headers::USER_AGENT.to_string(),
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Disable TLS verification (debugging against intercepting proxies).
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.verify_tls = !accept;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the session, ready to be shared across services.
    pub fn build(self) -> Result<Arc<HttpSession>> {
        let client = Client::builder()
            .user_agent(self.user_agent)
            .default_headers(headers::browser_headers())
            .cookie_store(true)
            .redirect(Policy::limited(self.max_redirects))
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Arc::new(HttpSession {
            client,
            endpoints: self.endpoints,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_session_with_custom_endpoints() {
        let session = HttpSession::builder()
            .endpoints(Endpoints::new().with_idp_base("http://127.0.0.1:1"))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(session.endpoints().idp_base(), "http://127.0.0.1:1");
    }
}
