use std::collections::HashSet;

use bytes::Bytes;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    consultation::{
        ports::{ConsultationRepository, Deidentifier, SuggestionClient},
        value_objects::Step,
    },
    reports::{
        helpers::{parse_stored_reports, summarize_reports},
        ports::{ReportExtractor, ReportService, WearableExtractor},
        value_objects::{ReportBatch, ReportSummary, UploadedReport},
    },
};

/// Validate and extract a batch of uploaded report files.
///
/// Per file: empty filenames are skipped; duplicate filenames
/// (case-insensitive, against `seen_filenames`) are rejected; a file is
/// accepted when either its media type or its extension matches the
/// extractor's allow-lists; the extraction result must be a field mapping,
/// since downstream consumers rely on key lookups. Any rejection fails the
/// whole batch. Extractor failures are reported as a validation error,
/// never as a raw internal one.
pub async fn process_uploaded_reports<E: ReportExtractor>(
    files: &[UploadedReport],
    seen_filenames: &mut HashSet<String>,
    extractor: &E,
) -> Result<Vec<Value>, CoreError> {
    let allowed_media_types = extractor.allowed_media_types();
    let allowed_extensions = extractor.allowed_extensions();

    let mut documents = Vec::new();

    for file in files {
        if file.filename.is_empty() {
            continue;
        }
        let filename_lower = file.filename.to_lowercase();

        if seen_filenames.contains(&filename_lower) {
            return Err(CoreError::Validation("File already uploaded".to_string()));
        }

        // Accept if EITHER the media type OR the extension matches.
        let media_type_ok = allowed_media_types.contains(&file.content_type);
        let extension_ok = allowed_extensions
            .iter()
            .any(|ext| filename_lower.ends_with(&format!(".{ext}")));
        if !media_type_ok && !extension_ok {
            return Err(CoreError::Validation(
                "Only PDF, PNG, JPEG, JPG files allowed".to_string(),
            ));
        }

        let document = match extractor.extract(file.data.clone()).await {
            Ok(document) => document,
            Err(err) => {
                error!("Report extraction failed: {err}");
                return Err(CoreError::Validation(
                    "Failed to extract report data".to_string(),
                ));
            }
        };

        let Value::Object(mut document) = document else {
            warn!("Unexpected extractor output type");
            return Err(CoreError::Validation("Failed to process report".to_string()));
        };

        document.insert(
            "filename".to_string(),
            Value::String(file.filename.clone()),
        );
        documents.push(Value::Object(document));
        seen_filenames.insert(filename_lower);
    }

    Ok(documents)
}

impl<CR, RE, WE, SC, DE> ReportService for Service<CR, RE, WE, SC, DE>
where
    CR: ConsultationRepository,
    RE: ReportExtractor,
    WE: WearableExtractor,
    SC: SuggestionClient,
    DE: Deidentifier,
{
    async fn list_reports(&self, patient_id: Uuid) -> Result<Vec<ReportSummary>, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        let reports = parse_stored_reports(view.consultation.previous_tests.as_ref());

        Ok(summarize_reports(&reports))
    }

    async fn upload_reports(
        &self,
        patient_id: Uuid,
        files: Vec<UploadedReport>,
    ) -> Result<ReportBatch, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        let mut reports = parse_stored_reports(view.consultation.previous_tests.as_ref());
        let mut seen_filenames: HashSet<String> = reports
            .iter()
            .filter_map(|report| report.get("filename"))
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect();

        let new_reports =
            process_uploaded_reports(&files, &mut seen_filenames, &self.report_extractor).await?;
        reports.extend(new_reports);
        let total_reports = reports.len();

        self.consultation_repository
            .save_previous_tests(view.consultation.id, reports)
            .await?;

        info!(
            patient_id = %patient_id,
            total_reports,
            "Saved uploaded medical reports"
        );

        Ok(ReportBatch {
            uploaded_files: files.into_iter().map(|file| file.filename).collect(),
            total_reports,
            next_step: self.current_step(patient_id).await?,
        })
    }

    async fn skip_reports(&self, patient_id: Uuid) -> Result<Step, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        // An empty list is a deliberate marker: the step was taken, there
        // is just nothing to store. Absent and empty must stay distinct.
        self.consultation_repository
            .save_previous_tests(view.consultation.id, Vec::new())
            .await?;

        self.current_step(patient_id).await
    }

    async fn upload_wearable(&self, patient_id: Uuid, data: Bytes) -> Result<Step, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        if data.is_empty() {
            return Err(CoreError::Validation("No file provided".to_string()));
        }

        let wearable_data = match self.wearable_extractor.extract(data).await {
            Ok(wearable_data) => wearable_data,
            Err(err) => {
                error!("Wearable extraction failed: {err}");
                return Err(CoreError::Validation(
                    "Failed to process wearable data".to_string(),
                ));
            }
        };

        self.consultation_repository
            .set_wearable_data(view.consultation.id, wearable_data)
            .await?;

        self.current_step(patient_id).await
    }

    async fn skip_wearable(&self, patient_id: Uuid) -> Result<Step, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        self.consultation_repository
            .set_wearable_data(view.consultation.id, Value::Array(Vec::new()))
            .await?;

        self.current_step(patient_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::domain::consultation::{
        entities::{Consultation, ConsultationView, Patient},
        ports::{MockConsultationRepository, MockDeidentifier, MockSuggestionClient},
    };
    use crate::domain::reports::ports::{MockReportExtractor, MockWearableExtractor};

    fn extractor_with_allow_lists() -> MockReportExtractor {
        let mut extractor = MockReportExtractor::new();
        extractor.expect_allowed_media_types().returning(|| {
            vec![
                "application/pdf".to_string(),
                "image/png".to_string(),
                "image/jpeg".to_string(),
            ]
        });
        extractor.expect_allowed_extensions().returning(|| {
            vec![
                "pdf".to_string(),
                "png".to_string(),
                "jpeg".to_string(),
                "jpg".to_string(),
            ]
        });
        extractor
    }

    fn upload(filename: &str, content_type: &str) -> UploadedReport {
        UploadedReport {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn extracted_documents_are_tagged_with_filename() {
        let mut extractor = extractor_with_allow_lists();
        extractor
            .expect_extract()
            .returning(|_| Box::pin(async { Ok(json!({"Observation": {"value": 120}})) }));

        let files = vec![upload("bp.pdf", "application/pdf")];
        let mut seen = HashSet::new();

        let documents = process_uploaded_reports(&files, &mut seen, &extractor)
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["filename"], "bp.pdf");
        assert_eq!(documents[0]["Observation"]["value"], 120);
        assert!(seen.contains("bp.pdf"));
    }

    #[tokio::test]
    async fn duplicate_filename_is_rejected_case_insensitively() {
        let mut extractor = extractor_with_allow_lists();
        extractor
            .expect_extract()
            .returning(|_| Box::pin(async { Ok(json!({"Observation": {}})) }));

        let files = vec![
            upload("Labs.pdf", "application/pdf"),
            upload("LABS.PDF", "application/pdf"),
        ];
        let mut seen = HashSet::new();

        let result = process_uploaded_reports(&files, &mut seen, &extractor).await;
        assert_eq!(
            result,
            Err(CoreError::Validation("File already uploaded".to_string()))
        );
        // The first file of the batch had been accepted before the
        // duplicate aborted the batch.
        assert!(seen.contains("labs.pdf"));
    }

    #[tokio::test]
    async fn wrong_media_type_with_pdf_extension_is_accepted() {
        let mut extractor = extractor_with_allow_lists();
        extractor
            .expect_extract()
            .times(1)
            .returning(|_| Box::pin(async { Ok(json!({"DiagnosticReport": {}})) }));

        let files = vec![upload("report.pdf", "application/octet-stream")];
        let mut seen = HashSet::new();

        let documents = process_uploaded_reports(&files, &mut seen, &extractor)
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
    }

    #[tokio::test]
    async fn wrong_media_type_and_extension_is_rejected() {
        let extractor = extractor_with_allow_lists();

        let files = vec![upload("notes.docx", "application/msword")];
        let mut seen = HashSet::new();

        let result = process_uploaded_reports(&files, &mut seen, &extractor).await;
        assert_eq!(
            result,
            Err(CoreError::Validation(
                "Only PDF, PNG, JPEG, JPG files allowed".to_string()
            ))
        );
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn non_mapping_extractor_output_is_rejected() {
        let mut extractor = extractor_with_allow_lists();
        extractor
            .expect_extract()
            .returning(|_| Box::pin(async { Ok(json!(["not", "a", "mapping"])) }));

        let files = vec![upload("scan.png", "image/png")];
        let mut seen = HashSet::new();

        let result = process_uploaded_reports(&files, &mut seen, &extractor).await;
        assert_eq!(
            result,
            Err(CoreError::Validation("Failed to process report".to_string()))
        );
    }

    #[tokio::test]
    async fn extractor_failure_becomes_a_validation_error() {
        let mut extractor = extractor_with_allow_lists();
        extractor.expect_extract().returning(|_| {
            Box::pin(async {
                Err(CoreError::ExternalServiceError(
                    "model timed out".to_string(),
                ))
            })
        });

        let files = vec![upload("scan.png", "image/png")];
        let mut seen = HashSet::new();

        let result = process_uploaded_reports(&files, &mut seen, &extractor).await;
        assert_eq!(
            result,
            Err(CoreError::Validation(
                "Failed to extract report data".to_string()
            ))
        );
    }

    fn patient() -> Patient {
        Patient {
            id: Uuid::new_v4(),
            age: Some(58),
            gender: Some("female".to_string()),
            created_at: Utc::now(),
        }
    }

    fn view_with_tests(patient: &Patient, previous_tests: Option<Value>) -> ConsultationView {
        let mut consultation = Consultation::new(patient.id);
        consultation.diet = Some("balanced".to_string());
        consultation.symptoms = Some("vertigo".to_string());
        consultation.mental_health = Some("stable".to_string());
        consultation.previous_tests = previous_tests;
        ConsultationView {
            consultation,
            selected_diagnoses: Vec::new(),
            selected_exams: Vec::new(),
        }
    }

    fn repository_for(
        patient: &Patient,
        view: &ConsultationView,
    ) -> MockConsultationRepository {
        let mut repository = MockConsultationRepository::new();
        let (p, v) = (patient.clone(), view.clone());
        repository
            .expect_get_patient()
            .returning(move |_| {
                let p = p.clone();
                Box::pin(async move { Ok(Some(p)) })
            });
        repository
            .expect_latest_consultation()
            .returning(move |_| {
                let v = v.clone();
                Box::pin(async move { Ok(Some(v)) })
            });
        repository
    }

    #[tokio::test]
    async fn skip_reports_stores_an_empty_list() {
        let p = patient();
        let v = view_with_tests(&p, None);
        let consultation_id = v.consultation.id;

        let mut repository = repository_for(&p, &v);
        repository
            .expect_save_previous_tests()
            .withf(move |cid, reports| *cid == consultation_id && reports.is_empty())
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let svc = Service::new(
            repository,
            MockReportExtractor::new(),
            MockWearableExtractor::new(),
            MockSuggestionClient::new(),
            MockDeidentifier::new(),
        );

        // The mocked view still reports previous_tests as absent, so the
        // recomputed step stays on tests.
        let step = svc.skip_reports(p.id).await.unwrap();
        assert_eq!(step, Step::Tests);
    }

    #[tokio::test]
    async fn upload_merges_with_existing_documents() {
        let p = patient();
        let existing = json!([{"filename": "old.pdf", "Observation": {}}]);
        let v = view_with_tests(&p, Some(existing));
        let consultation_id = v.consultation.id;

        let mut repository = repository_for(&p, &v);
        repository
            .expect_save_previous_tests()
            .withf(move |cid, reports| {
                *cid == consultation_id
                    && reports.len() == 2
                    && reports[0]["filename"] == "old.pdf"
                    && reports[1]["filename"] == "new.pdf"
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut extractor = extractor_with_allow_lists();
        extractor
            .expect_extract()
            .returning(|_| Box::pin(async { Ok(json!({"DiagnosticReport": {}})) }));

        let svc = Service::new(
            repository,
            extractor,
            MockWearableExtractor::new(),
            MockSuggestionClient::new(),
            MockDeidentifier::new(),
        );

        let batch = svc
            .upload_reports(p.id, vec![upload("new.pdf", "application/pdf")])
            .await
            .unwrap();

        assert_eq!(batch.uploaded_files, vec!["new.pdf"]);
        assert_eq!(batch.total_reports, 2);
    }

    #[tokio::test]
    async fn duplicate_against_stored_documents_is_rejected() {
        let p = patient();
        let existing = json!([{"filename": "labs.pdf", "Observation": {}}]);
        let v = view_with_tests(&p, Some(existing));

        let repository = repository_for(&p, &v);
        let svc = Service::new(
            repository,
            extractor_with_allow_lists(),
            MockWearableExtractor::new(),
            MockSuggestionClient::new(),
            MockDeidentifier::new(),
        );

        let result = svc
            .upload_reports(p.id, vec![upload("LABS.pdf", "application/pdf")])
            .await;
        assert_eq!(
            result,
            Err(CoreError::Validation("File already uploaded".to_string()))
        );
    }

    #[tokio::test]
    async fn wearable_extraction_failure_is_client_visible() {
        let p = patient();
        let v = view_with_tests(&p, Some(json!([])));

        let mut wearable = MockWearableExtractor::new();
        wearable.expect_extract().returning(|_| {
            Box::pin(async {
                Err(CoreError::ExternalServiceError(
                    "unreadable export".to_string(),
                ))
            })
        });

        let svc = Service::new(
            repository_for(&p, &v),
            MockReportExtractor::new(),
            wearable,
            MockSuggestionClient::new(),
            MockDeidentifier::new(),
        );

        let result = svc
            .upload_wearable(p.id, Bytes::from_static(b"garbage"))
            .await;
        assert_eq!(
            result,
            Err(CoreError::Validation(
                "Failed to process wearable data".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn skip_wearable_stores_an_empty_array() {
        let p = patient();
        let v = view_with_tests(&p, Some(json!([])));
        let consultation_id = v.consultation.id;

        let mut repository = repository_for(&p, &v);
        repository
            .expect_set_wearable_data()
            .withf(move |cid, data| *cid == consultation_id && *data == json!([]))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let svc = Service::new(
            repository,
            MockReportExtractor::new(),
            MockWearableExtractor::new(),
            MockSuggestionClient::new(),
            MockDeidentifier::new(),
        );

        let step = svc.skip_wearable(p.id).await.unwrap();
        assert_eq!(step, Step::Wearable);
    }

    #[tokio::test]
    async fn list_reports_summarizes_stored_documents() {
        let p = patient();
        let stored = json!([
            {"filename": "labs.pdf", "Observation": {}, "Patient": {}},
            {"filename": "note.png"}
        ]);
        let v = view_with_tests(&p, Some(stored));

        let svc = Service::new(
            repository_for(&p, &v),
            MockReportExtractor::new(),
            MockWearableExtractor::new(),
            MockSuggestionClient::new(),
            MockDeidentifier::new(),
        );

        let summaries = svc.list_reports(p.id).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].resource_type, "Observation, Patient");
        assert_eq!(summaries[1].resource_type, "Bundle");
    }
}
