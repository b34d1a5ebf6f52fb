use crate::domain::common::{TelecareConfig, services::Service};
use crate::infrastructure::{
    agents::{
        deidentifier::HttpDeidentifier, diagnostics_client::HttpSuggestionClient,
        report_extractor::HttpReportExtractor, wearable_extractor::HttpWearableExtractor,
    },
    consultation::repositories::consultation_repository::PostgresConsultationRepository,
    db,
};

/// The fully wired service: Postgres store plus the HTTP collaborators.
pub type TelecareService = Service<
    PostgresConsultationRepository,
    HttpReportExtractor,
    HttpWearableExtractor,
    HttpSuggestionClient,
    HttpDeidentifier,
>;

/// Connect to the store, apply migrations and assemble the service with
/// its collaborators. Called once at process start; the embedding
/// application passes the service into its request handlers.
pub async fn build_service(config: TelecareConfig) -> anyhow::Result<TelecareService> {
    let db = db::connect(&config.database).await?;
    db::run_migrations(&db).await?;

    Ok(Service::new(
        PostgresConsultationRepository::new(db),
        HttpReportExtractor::new(config.agents.extraction_url.clone()),
        HttpWearableExtractor::new(config.agents.extraction_url),
        HttpSuggestionClient::new(config.agents.diagnostics_url),
        HttpDeidentifier::new(config.agents.deidentifier_url),
    ))
}
