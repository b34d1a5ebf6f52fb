use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::consultation::value_objects::Step;

/// One uploaded report file, read to completion before processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedReport {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Outcome of a report upload batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBatch {
    pub uploaded_files: Vec<String>,
    pub total_reports: usize,
    pub next_step: Step,
}

/// Display summary of one stored report document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub file_name: String,
    pub resource_type: String,
    pub content: serde_json::Value,
}
