use crate::domain::{
    consultation::ports::{ConsultationRepository, Deidentifier, SuggestionClient},
    reports::ports::{ReportExtractor, WearableExtractor},
};

/// Aggregate holding every port implementation the wizard services need.
///
/// Constructed once at process start; the collaborators are explicit
/// dependencies rather than process-global singletons.
#[derive(Debug, Clone)]
pub struct Service<CR, RE, WE, SC, DE>
where
    CR: ConsultationRepository,
    RE: ReportExtractor,
    WE: WearableExtractor,
    SC: SuggestionClient,
    DE: Deidentifier,
{
    pub consultation_repository: CR,
    pub report_extractor: RE,
    pub wearable_extractor: WE,
    pub suggestion_client: SC,
    pub deidentifier: DE,
}

impl<CR, RE, WE, SC, DE> Service<CR, RE, WE, SC, DE>
where
    CR: ConsultationRepository,
    RE: ReportExtractor,
    WE: WearableExtractor,
    SC: SuggestionClient,
    DE: Deidentifier,
{
    pub fn new(
        consultation_repository: CR,
        report_extractor: RE,
        wearable_extractor: WE,
        suggestion_client: SC,
        deidentifier: DE,
    ) -> Self {
        Self {
            consultation_repository,
            report_extractor,
            wearable_extractor,
            suggestion_client,
            deidentifier,
        }
    }
}
