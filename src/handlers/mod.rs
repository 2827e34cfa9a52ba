pub mod admin;
pub mod common;
pub mod franchise;
pub mod requests;
pub mod vendor;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    manifest::ManifestService, procurement::ProcurementService, reports::ReportService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub procurement: Arc<ProcurementService>,
    pub manifest: Arc<ManifestService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let manifest = Arc::new(ManifestService::new(
            db_pool.clone(),
            Some((*event_sender).clone()),
        ));
        let procurement = Arc::new(ProcurementService::new(
            db_pool.clone(),
            event_sender,
            manifest.clone(),
        ));
        let reports = Arc::new(ReportService::new(db_pool));

        Self {
            procurement,
            manifest,
            reports,
        }
    }
}
