//! Captcha location and resolution.
//!
//! The login page embeds the challenge image inline (a base64 data URI)
//! inside the `divCaptcha` container. This module locates and decodes the
//! image; recognition itself is delegated to an external
//! [`CaptchaResolver`] implementation.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;

use crate::error::{Error, Result};
use crate::form::decode_entities;

static CAPTCHA_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*\bid="divCaptcha"[^>]*>(.*?)</div>"#).expect("static pattern")
});
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img[^>]+src="([^"]+)""#).expect("static pattern"));

/// A decoded inline captcha image.
#[derive(Debug, Clone)]
pub struct CaptchaImage {
    mime: String,
    bytes: Vec<u8>,
}

impl CaptchaImage {
    /// Decode an inline `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(src: &str) -> Result<Self> {
        let rest = src
            .strip_prefix("data:")
            .ok_or(Error::CaptchaSourceNotFound {
                reason: "captcha image source is not an inline data URI",
            })?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or(Error::CaptchaSourceNotFound {
                reason: "captcha image data URI is not base64 encoded",
            })?;
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|_| Error::CaptchaSourceNotFound {
                reason: "captcha image payload is not valid base64",
            })?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// External captcha recognition boundary: image in, decoded text out.
#[async_trait::async_trait]
pub trait CaptchaResolver: Send + Sync {
    async fn resolve(&self, image: &CaptchaImage) -> anyhow::Result<String>;
}

/// Locates the challenge image in the login page and delegates
/// recognition to the configured resolver.
pub struct CaptchaService {
    resolver: Box<dyn CaptchaResolver>,
}

impl CaptchaService {
    pub fn new(resolver: Box<dyn CaptchaResolver>) -> Self {
        Self { resolver }
    }

    /// Find the inline captcha image in `html` and return the resolver's
    /// answer text.
    pub async fn resolve_captcha_from_html(&self, html: &str) -> Result<String> {
        let container = CAPTCHA_CONTAINER
            .captures(html)
            .and_then(|c| c.get(1))
            .ok_or(Error::CaptchaSourceNotFound {
                reason: "divCaptcha container with image not present",
            })?;
        let src = IMG_SRC
            .captures(container.as_str())
            .and_then(|c| c.get(1))
            .ok_or(Error::CaptchaSourceNotFound {
                reason: "divCaptcha container with image not present",
            })?;

        let image = CaptchaImage::from_data_uri(&decode_entities(src.as_str()))?;
        tracing::debug!(mime = image.mime(), bytes = image.bytes().len(), "Resolving captcha");

        self.resolver
            .resolve(&image)
            .await
            .map_err(Error::CaptchaResolver)
    }
}
