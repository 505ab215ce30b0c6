//! Document generation and retrieval.
//!
//! The landing page carries the reprint form; submitting it with the
//! synthesized partial-refresh fields makes the server generate the
//! constancia, after which a GET on the fixed file endpoint returns the
//! PDF bytes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::form;
use crate::session::HttpSession;

/// Extracts and submits the generation form, then downloads the file.
pub struct DocumentService {
    session: Arc<HttpSession>,
}

impl DocumentService {
    pub fn new(session: Arc<HttpSession>) -> Self {
        Self { session }
    }

    pub(crate) fn session(&self) -> &Arc<HttpSession> {
        &self.session
    }

    /// Submit the final form. The response body only matters as the
    /// generation trigger.
    pub async fn send_final_form(
        &self,
        action: &str,
        fields: &HashMap<String, String>,
    ) -> Result<String> {
        let response = self
            .session
            .client()
            .post(action)
            .form(fields)
            .send()
            .await
            .map_err(|e| Error::network("send final form", e))?;
        response
            .text()
            .await
            .map_err(|e| Error::network("send final form", e))
    }

    /// Fetch the generated document from the fixed file endpoint.
    pub async fn get_file_content(&self) -> Result<Vec<u8>> {
        let response = self
            .session
            .client()
            .get(self.session.endpoints().file())
            .send()
            .await
            .map_err(|e| Error::network("get file content", e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::network("get file content", e))?;
        Ok(bytes.to_vec())
    }

    /// Extract the generation form from the landing page, trigger
    /// generation, and return the document bytes.
    pub async fn download_document(&self, landing_html: &str) -> Result<Vec<u8>> {
        let descriptor =
            form::extract_final_form(landing_html, self.session.endpoints().document_base())?;
        self.send_final_form(&descriptor.action, &descriptor.fields)
            .await?;
        self.get_file_content().await
    }
}
