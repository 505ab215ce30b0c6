//! Identity-provider authentication flow.
//!
//! Drives the NIDP login sequence: session initialization, login-page
//! fetch, credential + captcha submission, verification probe, and the
//! three-leg logout. Every request rides on the shared cookie session.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::endpoints::LOGIN_QUERY;
use crate::error::{Error, Result};
use crate::session::HttpSession;

/// Marker the login page must contain for the flow to proceed.
const CAPTCHA_CONTAINER_MARKER: &str = "divCaptcha";

/// The taxpayer's RFC and CIEC password, supplied once at construction.
#[derive(Debug, Clone)]
pub struct Credentials {
    rfc: String,
    ciec: SecretString,
}

impl Credentials {
    pub fn new(rfc: impl Into<String>, ciec: impl Into<String>) -> Self {
        Self {
            rfc: rfc.into(),
            ciec: SecretString::from(ciec.into()),
        }
    }

    /// The RFC, also used as the post-login success marker.
    pub fn rfc(&self) -> &str {
        &self.rfc
    }
}

/// Authentication flow against the SAT identity provider.
pub struct AuthenticationService {
    session: Arc<HttpSession>,
    credentials: Credentials,
}

impl AuthenticationService {
    pub fn new(session: Arc<HttpSession>, credentials: Credentials) -> Self {
        Self {
            session,
            credentials,
        }
    }

    pub(crate) fn session(&self) -> &Arc<HttpSession> {
        &self.session
    }

    pub fn rfc(&self) -> &str {
        self.credentials.rfc()
    }

    /// GET the application entry point to establish session cookies.
    pub async fn initialize_app(&self) -> Result<()> {
        let endpoints = self.session.endpoints();
        self.session
            .client()
            .get(endpoints.app_entry())
            .query(&[("sid", "1")])
            .send()
            .await
            .map_err(|e| Error::network("initialize login session", e))?;
        Ok(())
    }

    /// POST the login endpoint with an empty body to obtain the login
    /// form with its embedded captcha.
    pub async fn get_login_form(&self) -> Result<String> {
        let endpoints = self.session.endpoints();
        let response = self
            .session
            .client()
            .post(endpoints.login())
            .query(&LOGIN_QUERY)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Origin", endpoints.idp_base())
            .header("Referer", endpoints.login_referer())
            .body("")
            .send()
            .await
            .map_err(|e| Error::network("get login form", e))?;

        let html = response
            .text()
            .await
            .map_err(|e| Error::network("get login form", e))?;

        // A body without the captcha container means we landed on some
        // other page: already authenticated, rate limited, or the markup
        // changed. Carry the body so callers can tell which.
        if !html.contains(CAPTCHA_CONTAINER_MARKER) {
            return Err(Error::LoginPageNotLoaded { html });
        }

        Ok(html)
    }

    /// Submit the RFC, CIEC, and captcha answer. The response body is
    /// returned without validation; call [`check_login`] to classify the
    /// outcome.
    ///
    /// [`check_login`]: Self::check_login
    pub async fn send_login_form(&self, captcha_value: &str) -> Result<String> {
        let endpoints = self.session.endpoints();
        let response = self
            .session
            .client()
            .post(endpoints.login())
            .query(&LOGIN_QUERY)
            .header("Origin", endpoints.idp_base())
            .header("Referer", endpoints.login_referer())
            .form(&[
                ("Ecom_User_ID", self.credentials.rfc.as_str()),
                ("Ecom_Password", self.credentials.ciec.expose_secret()),
                ("userCaptcha", captcha_value),
                ("submit", "Enviar"),
            ])
            .send()
            .await
            .map_err(|e| Error::network("send login form", e))?;

        response
            .text()
            .await
            .map_err(|e| Error::network("send login form", e))
    }

    /// Probe the application root and classify the login outcome.
    ///
    /// The captcha check runs first on purpose: the captcha-error page
    /// also omits the RFC, so reversing the order would misreport a bad
    /// captcha as bad credentials. Both checks are live substring matches
    /// against server-rendered content, a fragile heuristic rather than a
    /// protocol guarantee.
    pub async fn check_login(&self) -> Result<()> {
        let endpoints = self.session.endpoints();
        let response = self
            .session
            .client()
            .post(endpoints.app_entry())
            .query(&[("sid", "1")])
            .header("Host", endpoints.idp_host().to_string())
            .header("Referer", endpoints.login_referer())
            .send()
            .await
            .map_err(|e| Error::network("check login", e))?;

        let html = response
            .text()
            .await
            .map_err(|e| Error::network("check login", e))?;

        if html.contains("captcha") {
            return Err(Error::InvalidCaptcha);
        }
        if !html.contains(self.credentials.rfc.as_str()) {
            return Err(Error::InvalidCredentials);
        }

        tracing::debug!(rfc = %self.credentials.rfc, "Login verified");
        Ok(())
    }

    /// Close the session: satellite logout, portal close-session, then
    /// identity-provider logout, in that order.
    ///
    /// A transport failure aborts the remaining legs and surfaces as a
    /// network error; a partially logged-out session may still be live on
    /// the server side, which the caller should know about.
    pub async fn logout(&self) -> Result<()> {
        let endpoints = self.session.endpoints();
        let client = self.session.client();

        client
            .get(endpoints.logout_satellite())
            .send()
            .await
            .map_err(|e| Error::network("satellite logout", e))?;
        client
            .get(endpoints.close_session())
            .send()
            .await
            .map_err(|e| Error::network("close portal session", e))?;
        client
            .get(endpoints.logout())
            .send()
            .await
            .map_err(|e| Error::network("identity provider logout", e))?;

        Ok(())
    }
}
