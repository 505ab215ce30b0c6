//! Automated download of the SAT Constancia de Situación Fiscal (CSF).
//!
//! Drives a cookie-bearing HTTP session through the SAT login (RFC +
//! CIEC + captcha), the federated SSO handshake into the document
//! application, and the server-side generation of the constancia, then
//! returns the PDF bytes. Captcha recognition is delegated to an
//! external [`CaptchaResolver`] implementation.
//!
//! ```no_run
//! use csf_sat_scraper::{CaptchaImage, CaptchaResolver, Credentials, HttpSession, Scraper};
//!
//! struct MyResolver;
//!
//! #[async_trait::async_trait]
//! impl CaptchaResolver for MyResolver {
//!     async fn resolve(&self, image: &CaptchaImage) -> anyhow::Result<String> {
//!         // hand image.bytes() to your recognition backend
//!         todo!()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = HttpSession::builder().build()?;
//!     let scraper = Scraper::create(
//!         session,
//!         Box::new(MyResolver),
//!         Credentials::new("XAXX010101000", "my-ciec"),
//!     );
//!     let pdf = scraper.download().await?;
//!     std::fs::write("constancia.pdf", pdf)?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod captcha;
pub mod document;
pub mod endpoints;
pub mod error;
pub mod form;
pub mod headers;
pub mod scraper;
pub mod session;
pub mod sso;

pub use auth::{AuthenticationService, Credentials};
pub use captcha::{CaptchaImage, CaptchaResolver, CaptchaService};
pub use document::DocumentService;
pub use endpoints::Endpoints;
pub use error::{Error, Result};
pub use form::{extract_final_form, extract_form, FormDescriptor};
pub use scraper::Scraper;
pub use session::{HttpSession, SessionBuilder};
pub use sso::SsoHandler;
