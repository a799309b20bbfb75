//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes per document type
//! - Authentication and tenancy middleware
//! - Error to JSON mapping

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eximflow_core::notify::{NoopNotifier, NotificationSink};
use eximflow_core::render::DocumentRenderer;
use eximflow_db::{
    BrcRepository, CompanyRepository, ConversionRepository, EnquiryRepository,
    ExportOrderRepository, NumberingRepository, ProformaRepository, PurchaseOrderRepository,
    QuoteRepository, ShipmentRepository, ShippingBillRepository, StatsRepository,
};
use eximflow_shared::{JwtService, WorkflowConfig};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Numbering, validity and BRC window settings.
    pub workflow: WorkflowConfig,
    /// Receives workflow events after each commit.
    pub notifier: Arc<dyn NotificationSink>,
    /// Document renderer (optional).
    pub renderer: Option<Arc<dyn DocumentRenderer>>,
}

impl AppState {
    /// Creates state with the no-op notifier and no renderer.
    #[must_use]
    pub fn new(db: DatabaseConnection, jwt_service: JwtService, workflow: WorkflowConfig) -> Self {
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            workflow,
            notifier: Arc::new(NoopNotifier),
            renderer: None,
        }
    }

    /// Replaces the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Configures a document renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }

    pub(crate) fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.conn())
    }

    pub(crate) fn numbering(&self) -> NumberingRepository {
        NumberingRepository::new(self.conn())
    }

    pub(crate) fn enquiries(&self) -> EnquiryRepository {
        EnquiryRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn quotes(&self) -> QuoteRepository {
        QuoteRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn proformas(&self) -> ProformaRepository {
        ProformaRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn export_orders(&self) -> ExportOrderRepository {
        ExportOrderRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn purchase_orders(&self) -> PurchaseOrderRepository {
        PurchaseOrderRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn shipping_bills(&self) -> ShippingBillRepository {
        ShippingBillRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn shipments(&self) -> ShipmentRepository {
        ShipmentRepository::new(self.conn())
    }

    pub(crate) fn conversions(&self) -> ConversionRepository {
        ConversionRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn brcs(&self) -> BrcRepository {
        BrcRepository::new(self.conn())
            .with_notifier(self.notifier.clone())
            .with_workflow_config(self.workflow)
    }

    pub(crate) fn stats(&self) -> StatsRepository {
        StatsRepository::new(self.conn())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
