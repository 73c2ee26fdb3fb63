use std::sync::Arc;

use boxoffice_core::payment::PaymentGateway;
use boxoffice_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: boxoffice_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// External payment processor.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Publishes committed checkout events (order confirmations).
    pub event_bus: Arc<EventBus>,
}
