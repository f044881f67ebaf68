//! HTML → PDF conversion via an external rendering service.

use reqwest::blocking::Client;
use std::time::Duration;

const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PDF render request failed: {0}")]
    Request(String),

    #[error("PDF renderer returned {status}: {body}")]
    Status { status: u16, body: String },
}

pub trait PdfRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// POSTs the document as `text/html` and expects PDF bytes back
pub struct HttpPdfRenderer {
    endpoint: String,
}

impl HttpPdfRenderer {
    pub fn new(endpoint: &str) -> Self {
        Self { endpoint: endpoint.to_string() }
    }
}

impl PdfRenderer for HttpPdfRenderer {
    fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let client = Client::builder()
            .timeout(RENDER_TIMEOUT)
            .build()
            .map_err(|e| RenderError::Request(e.to_string()))?;

        let response = client
            .post(&self.endpoint)
            .header("Content-Type", "text/html; charset=utf-8")
            .header("Accept", "application/pdf")
            .body(html.to_string())
            .send()
            .map_err(|e| RenderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(RenderError::Status { status, body });
        }

        let bytes = response
            .bytes()
            .map_err(|e| RenderError::Request(e.to_string()))?;
        tracing::debug!(bytes = bytes.len(), "Rendered PDF");
        Ok(bytes.to_vec())
    }
}
