use std::future::Future;

use bytes::Bytes;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    consultation::value_objects::Step,
    reports::value_objects::{ReportBatch, ReportSummary, UploadedReport},
};

/// Extraction collaborator for medical report files. The allow-lists are
/// configuration the upload validator consults; extraction itself is
/// opaque and returns a structured field mapping.
#[cfg_attr(test, mockall::automock)]
pub trait ReportExtractor: Send + Sync {
    fn allowed_media_types(&self) -> Vec<String>;

    fn allowed_extensions(&self) -> Vec<String>;

    fn extract(
        &self,
        data: Bytes,
    ) -> impl Future<Output = Result<serde_json::Value, CoreError>> + Send;
}

/// Extraction collaborator for wearable data exports.
#[cfg_attr(test, mockall::automock)]
pub trait WearableExtractor: Send + Sync {
    fn extract(
        &self,
        data: Bytes,
    ) -> impl Future<Output = Result<serde_json::Value, CoreError>> + Send;
}

/// Service trait for the two upload steps of the wizard.
#[cfg_attr(test, mockall::automock)]
pub trait ReportService: Send + Sync {
    fn list_reports(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ReportSummary>, CoreError>> + Send;

    /// Validate and extract a batch of uploaded reports, then merge them
    /// into the stored documents. Any rejected file fails the whole batch
    /// and nothing is persisted.
    fn upload_reports(
        &self,
        patient_id: Uuid,
        files: Vec<UploadedReport>,
    ) -> impl Future<Output = Result<ReportBatch, CoreError>> + Send;

    /// Skip the uploads step by storing an empty document list, which
    /// still marks the step complete.
    fn skip_reports(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    fn upload_wearable(
        &self,
        patient_id: Uuid,
        data: Bytes,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    fn skip_wearable(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;
}
