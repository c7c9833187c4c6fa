pub mod distribution_service;
pub mod ingestion;
pub mod redemption_service;
