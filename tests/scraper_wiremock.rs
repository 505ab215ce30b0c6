use std::sync::Arc;

use csf_sat_scraper::{
    AuthenticationService, CaptchaImage, CaptchaResolver, CaptchaService, Credentials,
    DocumentService, Endpoints, Error, HttpSession, Scraper, SsoHandler,
};
use wiremock::matchers::{body_string, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RFC: &str = "XAXX010101000";
const CIEC: &str = "testPassword123";
const PDF_BYTES: &[u8] = b"%PDF-1.7 constancia";

struct FixedResolver(&'static str);

#[async_trait::async_trait]
impl CaptchaResolver for FixedResolver {
    async fn resolve(&self, image: &CaptchaImage) -> anyhow::Result<String> {
        assert_eq!(image.mime(), "image/jpeg");
        Ok(self.0.to_string())
    }
}

async fn session_for(server: &MockServer) -> Arc<HttpSession> {
    HttpSession::builder()
        .endpoints(
            Endpoints::new()
                .with_idp_base(server.uri())
                .with_portal_base(server.uri())
                .with_document_base(server.uri()),
        )
        .build()
        .unwrap()
}

fn login_page() -> &'static str {
    // "captcha" as base64 is Y2FwdGNoYQ==
    r#"<html><div id="divCaptcha"><img src="data:image/jpeg;base64,Y2FwdGNoYQ=="></div></html>"#
}

fn auto_submit_form(action: &str, name: &str, value: &str) -> String {
    format!(
        r#"<html><form method="post" action="{action}">
           <input type="hidden" name="{name}" value="{value}" />
           </form></html>"#
    )
}

/// Script the whole portal: login, SSO handshake, generation, download,
/// logout.
async fn mount_happy_path(server: &MockServer) {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/nidp/app"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;

    // Empty-body POST fetches the login form.
    Mock::given(method("POST"))
        .and(path("/nidp/app/login"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_raw(login_page(), "text/html"))
        .expect(1)
        .mount(server)
        .await;

    // Credential submission.
    Mock::given(method("POST"))
        .and(path("/nidp/app/login"))
        .and(body_string_contains("Ecom_User_ID=XAXX010101000"))
        .and(body_string_contains("userCaptcha=AB12C"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html"))
        .expect(1)
        .mount(server)
        .await;

    // Verification probe: body names the RFC, no captcha error.
    Mock::given(method("POST"))
        .and(path("/nidp/app"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!("<html>Bienvenido {RFC}</html>"), "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/app/seg/faces/pages/lanzador.jsf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            auto_submit_form(&format!("{base}/saml/acs1"), "SAMLResponse", "a1"),
            "text/html",
        ))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/saml/acs1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            auto_submit_form(&format!("{base}/saml/acs2"), "RelayState", "r1"),
            "text/html",
        ))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/saml/acs2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(r#"<html><iframe id="iframetoload" src="{base}/iframe/load?op=csf"></iframe></html>"#),
            "text/html",
        ))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iframe/load"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            auto_submit_form(&format!("{base}/saml2/acs1"), "SAMLRequest", "a2"),
            "text/html",
        ))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/saml2/acs1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            auto_submit_form(&format!("{base}/saml2/acs2"), "SAMLResponse", "a3"),
            "text/html",
        ))
        .expect(1)
        .mount(server)
        .await;

    // Authenticated landing page of the document application.
    Mock::given(method("POST"))
        .and(path("/saml2/acs2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><form id="formReimpAcuse" method="post"
                action="/PTSC/IdcSiat/IdcReimpAcuse.jsf">
                <input type="hidden" name="javax.faces.ViewState" value="-42:7" />
                </form></html>"#,
            "text/html",
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/PTSC/IdcSiat/IdcReimpAcuse.jsf"))
        .and(body_string_contains("javax.faces.partial.ajax=true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<?xml version=\"1.0\"?><partial-response/>", "text/xml"),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/PTSC/IdcSiat/IdcGeneraConstancia.jsf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PDF_BYTES, "application/pdf"))
        .expect(1)
        .mount(server)
        .await;

    for logout_path in ["/cs/Satellite", "/app/seg/cerrarSesion", "/nidp/app/plogout"] {
        Mock::given(method("GET"))
            .and(path(logout_path))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn download_runs_full_workflow_and_returns_document_bytes() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let session = session_for(&server).await;
    let scraper = Scraper::create(
        session,
        Box::new(FixedResolver("AB12C")),
        Credentials::new(RFC, CIEC),
    );

    let document = scraper.download().await.unwrap();
    assert_eq!(document, PDF_BYTES);

    // Logout runs last, after the download.
    let requests = server.received_requests().await.unwrap();
    let last_paths: Vec<_> = requests
        .iter()
        .rev()
        .take(3)
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        last_paths,
        ["/nidp/app/plogout", "/app/seg/cerrarSesion", "/cs/Satellite"]
    );
}

#[tokio::test]
async fn rejected_captcha_short_circuits_without_logout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nidp/app"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/nidp/app/login"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(login_page(), "text/html"))
        .mount(&server)
        .await;
    // The probe reports a captcha error.
    Mock::given(method("POST"))
        .and(path("/nidp/app"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>captcha incorrecto</html>", "text/html"),
        )
        .mount(&server)
        .await;
    for logout_path in ["/cs/Satellite", "/app/seg/cerrarSesion", "/nidp/app/plogout"] {
        Mock::given(method("GET"))
            .and(path(logout_path))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }

    let scraper = Scraper::create(
        session_for(&server).await,
        Box::new(FixedResolver("WRONG")),
        Credentials::new(RFC, CIEC),
    );

    let err = scraper.download().await.unwrap_err();
    assert!(matches!(err, Error::InvalidCaptcha));
}

#[test]
fn construction_rejects_services_with_a_different_session() {
    let session = HttpSession::builder().build().unwrap();
    let other_session = HttpSession::builder().build().unwrap();

    let result = Scraper::new(
        Arc::clone(&session),
        AuthenticationService::new(other_session, Credentials::new(RFC, CIEC)),
        CaptchaService::new(Box::new(FixedResolver("unused"))),
        SsoHandler::new(Arc::clone(&session)),
        DocumentService::new(Arc::clone(&session)),
    );

    match result {
        Err(Error::SessionMismatch { service }) => {
            assert_eq!(service, "authentication service");
        }
        Err(other) => panic!("expected SessionMismatch, got {other:?}"),
        Ok(_) => panic!("expected SessionMismatch, got a scraper"),
    }
}

#[test]
fn construction_accepts_services_sharing_the_scraper_session() {
    let session = HttpSession::builder().build().unwrap();

    let scraper = Scraper::new(
        Arc::clone(&session),
        AuthenticationService::new(Arc::clone(&session), Credentials::new(RFC, CIEC)),
        CaptchaService::new(Box::new(FixedResolver("unused"))),
        SsoHandler::new(Arc::clone(&session)),
        DocumentService::new(Arc::clone(&session)),
    );
    assert!(scraper.is_ok());
}
