use std::sync::Arc;

use kontrol_core::export::ReportExporter;
use kontrol_core::photos::PhotoStorage;
use kontrol_core::store::InspectionStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool for the directory and reporting queries.
    pub pool: kontrol_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Persistence for sessions and reports.
    pub store: Arc<dyn InspectionStore>,
    /// Where uploaded inspection photos go.
    pub photos: Arc<dyn PhotoStorage>,
    pub exporter: Arc<dyn ReportExporter>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<kontrol_events::EventBus>,
}
