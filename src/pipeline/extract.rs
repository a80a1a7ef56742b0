//! Remote extraction: POST one batch PDF, get Markdown back.
//!
//! The service is opaque. The request body is the raw PDF with
//! `Content-Type: application/octet-stream`; HTTP 200 means the body is the
//! Markdown for that batch, anything else is a failure whose body explains
//! why. There is no retry and no local caching. The first failure ends the
//! run.

use crate::config::RunConfig;
use crate::error::Pdf2SheetsError;
use crate::pipeline::split::PageBatch;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Turns one batch PDF into Markdown.
///
/// [`HttpExtractor`] is the production implementation; tests substitute
/// their own.
pub trait Extractor {
    fn extract(&self, batch: &PageBatch) -> Result<String, Pdf2SheetsError>;
}

/// Blocking HTTP client for the extraction service.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: Client,
    endpoint: String,
}

impl HttpExtractor {
    /// Build a client for `config.endpoint`.
    pub fn new(config: &RunConfig) -> Result<Self, Pdf2SheetsError> {
        let mut builder =
            Client::builder().user_agent(concat!("pdf2sheets/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| Pdf2SheetsError::Http {
            url: config.endpoint.clone(),
            detail: e.to_string(),
        })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Extractor for HttpExtractor {
    fn extract(&self, batch: &PageBatch) -> Result<String, Pdf2SheetsError> {
        let start = Instant::now();
        let http_err = |e: reqwest::Error| Pdf2SheetsError::Http {
            url: self.endpoint.clone(),
            detail: e.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(batch.bytes.clone())
            .send()
            .map_err(http_err)?;

        let status = response.status();
        let body = response.text().map_err(http_err)?;

        if status != StatusCode::OK {
            warn!(
                "Batch {}: extraction service answered HTTP {}: {}",
                batch.index, status, body
            );
            return Err(Pdf2SheetsError::Extraction {
                batch: batch.index,
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "Batch {}: {} bytes of Markdown in {:?}",
            batch.index,
            body.len(),
            start.elapsed()
        );
        Ok(body)
    }
}
