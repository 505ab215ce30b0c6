//! Federated SSO handshake.
//!
//! After the identity-provider login, reaching the document application
//! requires replaying the browser's SAML redirect chain: the portal
//! launcher returns an auto-submit form, the federation needs two chained
//! POSTs, and the resulting page embeds an iframe whose target runs a
//! second two-POST exchange at the document application's own security
//! boundary. Six requests total on the happy path.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{Error, Result};
use crate::form::{self, decode_entities};
use crate::session::HttpSession;

static IFRAME_TO_LOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<iframe[^>]+id="iframetoload"[^>]+src="([^"]+)""#).expect("static pattern")
});

/// Stateless driver of the SAML handshake; needs an authenticated
/// session.
pub struct SsoHandler {
    session: Arc<HttpSession>,
}

impl SsoHandler {
    pub fn new(session: Arc<HttpSession>) -> Self {
        Self { session }
    }

    pub(crate) fn session(&self) -> &Arc<HttpSession> {
        &self.session
    }

    /// Extract and submit the auto-submit form in `html`, then extract
    /// and submit the form in that response as well. The federation
    /// always relays through two chained POSTs, never one.
    pub async fn handle_sso_forms(&self, html: &str) -> Result<String> {
        let client = self.session.client();

        let descriptor = form::extract_form(html)?;
        let response = client
            .post(&descriptor.action)
            .form(&descriptor.fields)
            .send()
            .await
            .map_err(|e| Error::network("submit SAML assertion", e))?;
        let html = response
            .text()
            .await
            .map_err(|e| Error::network("submit SAML assertion", e))?;

        let descriptor = form::extract_form(&html)?;
        let response = client
            .post(&descriptor.action)
            .form(&descriptor.fields)
            .send()
            .await
            .map_err(|e| Error::network("submit SAML relay", e))?;
        response
            .text()
            .await
            .map_err(|e| Error::network("submit SAML relay", e))
    }

    /// Run the full handshake: launcher, first SAML exchange, iframe
    /// fetch, second SAML exchange. Returns the authenticated landing
    /// page of the document application.
    pub async fn handle_sso_workflow(&self) -> Result<String> {
        let endpoints = self.session.endpoints();
        let client = self.session.client();

        let response = client
            .get(endpoints.launcher())
            .header("Host", endpoints.portal_host().to_string())
            .send()
            .await
            .map_err(|e| Error::network("open SSO launcher", e))?;
        let html = response
            .text()
            .await
            .map_err(|e| Error::network("open SSO launcher", e))?;

        let html_with_iframe = self.handle_sso_forms(&html).await?;

        let iframe_src = IFRAME_TO_LOAD
            .captures(&html_with_iframe)
            .and_then(|c| c.get(1))
            .ok_or(Error::SsoIframeNotFound)?;
        let iframe_url = decode_entities(iframe_src.as_str());
        tracing::debug!(url = %iframe_url, "SSO handshake reached embedded iframe");

        let response = client
            .get(&iframe_url)
            .send()
            .await
            .map_err(|e| Error::network("load SSO iframe", e))?;
        let html = response
            .text()
            .await
            .map_err(|e| Error::network("load SSO iframe", e))?;

        // The iframe body starts a second SAML exchange against the
        // document application's own security boundary.
        self.handle_sso_forms(&html).await
    }
}
