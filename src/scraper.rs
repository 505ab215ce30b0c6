//! End-to-end workflow orchestration.

use std::sync::Arc;

use crate::auth::{AuthenticationService, Credentials};
use crate::captcha::{CaptchaResolver, CaptchaService};
use crate::document::DocumentService;
use crate::error::{Error, Result};
use crate::session::HttpSession;
use crate::sso::SsoHandler;

/// Owns one shared HTTP session and wires the flow services into a
/// single `download` operation.
pub struct Scraper {
    session: Arc<HttpSession>,
    auth: AuthenticationService,
    captcha: CaptchaService,
    sso: SsoHandler,
    document: DocumentService,
}

impl Scraper {
    /// Assemble a scraper from pre-built services.
    ///
    /// Every service must hold the same session instance as the scraper;
    /// a service with its own session would keep its own cookie jar and
    /// silently break the flow, so mismatches are rejected here.
    pub fn new(
        session: Arc<HttpSession>,
        auth: AuthenticationService,
        captcha: CaptchaService,
        sso: SsoHandler,
        document: DocumentService,
    ) -> Result<Self> {
        if !Arc::ptr_eq(&session, auth.session()) {
            return Err(Error::SessionMismatch {
                service: "authentication service",
            });
        }
        if !Arc::ptr_eq(&session, sso.session()) {
            return Err(Error::SessionMismatch {
                service: "SSO handler",
            });
        }
        if !Arc::ptr_eq(&session, document.session()) {
            return Err(Error::SessionMismatch {
                service: "document service",
            });
        }

        Ok(Self {
            session,
            auth,
            captcha,
            sso,
            document,
        })
    }

    /// Wire all services from one session, a captcha resolver, and the
    /// taxpayer credentials.
    pub fn create(
        session: Arc<HttpSession>,
        resolver: Box<dyn CaptchaResolver>,
        credentials: Credentials,
    ) -> Self {
        Self {
            auth: AuthenticationService::new(Arc::clone(&session), credentials),
            captcha: CaptchaService::new(resolver),
            sso: SsoHandler::new(Arc::clone(&session)),
            document: DocumentService::new(Arc::clone(&session)),
            session,
        }
    }

    /// The shared session (e.g. to inspect configured endpoints).
    pub fn session(&self) -> &Arc<HttpSession> {
        &self.session
    }

    /// Run the whole workflow and return the generated document bytes.
    ///
    /// Short-circuits on the first failure; logout only runs after a
    /// fully successful flow. A failed run cannot be resumed, restart
    /// from a fresh call.
    pub async fn download(&self) -> Result<Vec<u8>> {
        tracing::debug!(rfc = %self.auth.rfc(), "Starting CSF download workflow");

        self.auth.initialize_app().await?;
        let login_html = self.auth.get_login_form().await?;
        let captcha_value = self.captcha.resolve_captcha_from_html(&login_html).await?;
        self.auth.send_login_form(&captcha_value).await?;
        self.auth.check_login().await?;

        let landing_html = self.sso.handle_sso_workflow().await?;
        let document = self.document.download_document(&landing_html).await?;

        self.auth.logout().await?;

        tracing::info!(bytes = document.len(), "CSF downloaded");
        Ok(document)
    }
}
