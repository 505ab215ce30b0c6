//! Failure taxonomy for the scraping workflow.
//!
//! Every failure the workflow can surface is one variant of [`Error`], so
//! callers can decide whether to retry with a fresh captcha, restart the
//! whole workflow, or give up.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All the ways a scraping run can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connection, timeout, TLS), tagged with the
    /// operation that was in flight.
    #[error("network failure while trying to {operation}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// An expected `<form>` was missing from a page.
    #[error("expected form not found: {context}")]
    FormNotFound { context: &'static str },

    /// The login page did not contain a usable captcha image.
    #[error("captcha image not found in login page: {reason}")]
    CaptchaSourceNotFound { reason: &'static str },

    /// The external captcha resolver failed to produce an answer.
    #[error("captcha resolver failed")]
    CaptchaResolver(#[source] anyhow::Error),

    /// The login endpoint returned a page without the captcha container.
    ///
    /// Carries the full body so callers can inspect what the server
    /// actually sent (already-authenticated page, rate limiting, markup
    /// drift).
    #[error("unable to retrieve login form with captcha")]
    LoginPageNotLoaded { html: String },

    /// The SSO handshake did not produce the expected embedded iframe.
    #[error("iframetoload not found in SSO workflow")]
    SsoIframeNotFound,

    /// The server rejected the captcha answer.
    #[error("invalid captcha")]
    InvalidCaptcha,

    /// The server rejected the RFC/CIEC pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A service was constructed with a different HTTP session than the
    /// scraper, which would split cookies across two jars.
    #[error("{service} HTTP session is not the same as the scraper session")]
    SessionMismatch { service: &'static str },
}

impl Error {
    pub(crate) fn network(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Network { operation, source }
    }

    /// Transport-level failure; the whole workflow is safe to retry.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// An expected HTML marker/form/attribute was missing, meaning the
    /// session diverged from the expected page sequence (markup may have
    /// changed).
    pub fn is_protocol_shape(&self) -> bool {
        matches!(
            self,
            Self::FormNotFound { .. }
                | Self::CaptchaSourceNotFound { .. }
                | Self::LoginPageNotLoaded { .. }
                | Self::SsoIframeNotFound
        )
    }

    /// The server explicitly rejected the login attempt. `InvalidCaptcha`
    /// is safe to retry with a fresh captcha; `InvalidCredentials` is not.
    pub fn is_authentication_rejected(&self) -> bool {
        matches!(self, Self::InvalidCaptcha | Self::InvalidCredentials)
    }
}
