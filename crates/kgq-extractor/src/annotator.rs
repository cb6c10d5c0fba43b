//! HTTP client for an external annotation service
//!
//! The service receives `{"text": ...}` and answers with an annotated
//! [`Document`] as JSON (tokens with lemma and dependency label, entity
//! spans per sentence).

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use kgq_core::{AnnotatorConfig, Annotator, Document, KgError, Result};

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    text: &'a str,
}

/// Blocking annotator backed by an HTTP endpoint
pub struct HttpAnnotator {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpAnnotator {
    /// Create from config; the timeout applies to each request
    pub fn new(config: &AnnotatorConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KgError::AnnotationFailure(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Annotator for HttpAnnotator {
    fn annotate(&self, text: &str) -> Result<Document> {
        debug!(url = %self.url, chars = text.len(), "Requesting annotation");

        let response = self
            .client
            .post(&self.url)
            .json(&AnnotateRequest { text })
            .send()
            .map_err(|e| KgError::AnnotationFailure(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(KgError::AnnotationFailure(format!(
                "Annotator returned {status}: {body}"
            )));
        }

        let body = response
            .text()
            .map_err(|e| KgError::AnnotationFailure(format!("Failed to read response: {e}")))?;
        parse_document(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Decode an annotator response body
pub fn parse_document(body: &str) -> Result<Document> {
    serde_json::from_str(body)
        .map_err(|e| KgError::AnnotationFailure(format!("Failed to parse response: {e}")))
}
