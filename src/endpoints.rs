//! SAT endpoint table.
//!
//! The workflow talks to three hosts: the identity provider
//! (`login.siat.sat.gob.mx`), the main portal (`wwwmat.sat.gob.mx`), and
//! the document application (`rfcampc.siat.sat.gob.mx`). Every base is
//! overridable so tests can point the whole flow at a mock server.

const IDP_BASE: &str = "https://login.siat.sat.gob.mx";
const PORTAL_BASE: &str = "https://wwwmat.sat.gob.mx";
const DOCUMENT_BASE: &str = "https://rfcampc.siat.sat.gob.mx";

/// Fixed-selector query string for the credential login endpoint.
pub const LOGIN_QUERY: [(&str, &str); 3] = [("id", "ptsc-ciec"), ("sid", "1"), ("option", "credential")];

/// Base URLs for the three SAT hosts involved in the workflow.
#[derive(Debug, Clone)]
pub struct Endpoints {
    idp_base: String,
    portal_base: String,
    document_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            idp_base: IDP_BASE.to_string(),
            portal_base: PORTAL_BASE.to_string(),
            document_base: DOCUMENT_BASE.to_string(),
        }
    }
}

impl Endpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the identity-provider base URL (tests).
    pub fn with_idp_base(mut self, base: impl Into<String>) -> Self {
        self.idp_base = trim_base(base.into());
        self
    }

    /// Override the portal base URL (tests).
    pub fn with_portal_base(mut self, base: impl Into<String>) -> Self {
        self.portal_base = trim_base(base.into());
        self
    }

    /// Override the document-application base URL (tests).
    pub fn with_document_base(mut self, base: impl Into<String>) -> Self {
        self.document_base = trim_base(base.into());
        self
    }

    pub fn idp_base(&self) -> &str {
        &self.idp_base
    }

    pub fn portal_base(&self) -> &str {
        &self.portal_base
    }

    pub fn document_base(&self) -> &str {
        &self.document_base
    }

    /// Application entry point; establishes the session cookies.
    pub fn app_entry(&self) -> String {
        format!("{}/nidp/app", self.idp_base)
    }

    /// Credential + captcha login endpoint.
    pub fn login(&self) -> String {
        format!("{}/nidp/app/login", self.idp_base)
    }

    /// Referer the identity provider expects on login-related requests.
    pub fn login_referer(&self) -> String {
        format!("{}?id=ptsc-ciec&sid=1&option=credential", self.login())
    }

    /// SSO launcher ("lanzador") that redirects into the federation
    /// handshake for the CSF generation operation.
    pub fn launcher(&self) -> String {
        format!(
            "{base}/app/seg/faces/pages/lanzador.jsf\
             ?url=/operacion/53027/genera-tu-constancia-de-situacion-fiscal\
             &tipoLogeo=c&target=principal&hostServer={base}",
            base = self.portal_base
        )
    }

    /// First logout leg: the portal satellite logout.
    pub fn logout_satellite(&self) -> String {
        format!(
            "{}/cs/Satellite?childpagename=Common/Logic/COMMON_Logout\
             &packedargs=locale=1462228413195&pagename=TySWrapper",
            self.portal_base
        )
    }

    /// Second logout leg: closes the portal session.
    pub fn close_session(&self) -> String {
        format!("{}/app/seg/cerrarSesion", self.portal_base)
    }

    /// Third logout leg: the identity-provider logout.
    pub fn logout(&self) -> String {
        format!("{}/nidp/app/plogout", self.idp_base)
    }

    /// Endpoint that serves the generated document.
    pub fn file(&self) -> String {
        format!("{}/PTSC/IdcSiat/IdcGeneraConstancia.jsf", self.document_base)
    }

    /// Host (with port, if any) of the identity-provider base.
    pub fn idp_host(&self) -> &str {
        host_of(&self.idp_base)
    }

    /// Host (with port, if any) of the portal base.
    pub fn portal_host(&self) -> &str {
        host_of(&self.portal_base)
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

fn host_of(base: &str) -> &str {
    let rest = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .unwrap_or(base);
    rest.split('/').next().unwrap_or(rest)
}
