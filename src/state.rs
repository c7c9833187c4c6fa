use std::sync::Arc;
use crate::domain::ports::{AttendeeRepository, CodeImageStore, EmailService};
use crate::domain::services::{
    distribution_service::DistributionService,
    ingestion::IngestionService,
    redemption_service::RedemptionService,
};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub attendee_repo: Arc<dyn AttendeeRepository>,
    pub code_store: Arc<dyn CodeImageStore>,
    pub email_service: Arc<dyn EmailService>,
    pub redemption_service: Arc<RedemptionService>,
    pub ingestion_service: Arc<IngestionService>,
    pub distribution_service: Arc<DistributionService>,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Wires the services on top of one store handle built at startup.
    pub fn new(
        config: Config,
        attendee_repo: Arc<dyn AttendeeRepository>,
        code_store: Arc<dyn CodeImageStore>,
        email_service: Arc<dyn EmailService>,
        templates: Arc<Tera>,
    ) -> Self {
        let redemption_service = Arc::new(RedemptionService::new(attendee_repo.clone()));
        let ingestion_service = Arc::new(IngestionService::new(attendee_repo.clone(), code_store.clone()));
        let distribution_service = Arc::new(DistributionService::new(
            attendee_repo.clone(),
            code_store.clone(),
            email_service.clone(),
            config.event_name.clone(),
        ));

        Self {
            config,
            attendee_repo,
            code_store,
            email_service,
            redemption_service,
            ingestion_service,
            distribution_service,
            templates,
        }
    }
}
