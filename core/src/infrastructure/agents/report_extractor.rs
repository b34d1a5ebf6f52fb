use bytes::Bytes;
use reqwest::Client;

use crate::domain::{common::entities::app_errors::CoreError, reports::ports::ReportExtractor};

const ALLOWED_MEDIA_TYPES: [&str; 3] = ["application/pdf", "image/png", "image/jpeg"];
const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpeg", "jpg"];

/// HTTP client for the medical-report extraction service. Extraction is a
/// black box returning a structured field mapping; the allow-lists it
/// advertises are what the upload validator consults.
#[derive(Debug, Clone)]
pub struct HttpReportExtractor {
    base_url: String,
    client: Client,
    allowed_media_types: Vec<String>,
    allowed_extensions: Vec<String>,
}

impl HttpReportExtractor {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
            allowed_media_types: ALLOWED_MEDIA_TYPES.map(str::to_string).to_vec(),
            allowed_extensions: ALLOWED_EXTENSIONS.map(str::to_string).to_vec(),
        }
    }
}

impl ReportExtractor for HttpReportExtractor {
    fn allowed_media_types(&self) -> Vec<String> {
        self.allowed_media_types.clone()
    }

    fn allowed_extensions(&self) -> Vec<String> {
        self.allowed_extensions.clone()
    }

    async fn extract(&self, data: Bytes) -> Result<serde_json::Value, CoreError> {
        let url = format!("{}/reports/extract", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Report extraction request failed: {}", e);
                CoreError::ExternalServiceError(format!("Extraction service error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Extraction service error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "Extraction service returned error: {} - {}",
                status, error_text
            )));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            tracing::error!("Failed to parse extraction response: {}", e);
            CoreError::ExternalServiceError(format!("Failed to parse extraction response: {}", e))
        })
    }
}
