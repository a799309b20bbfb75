//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories that persist workflow transitions, conversions and payments
//! - Database migrations
//! - Row-level security context helpers

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod rls;

pub use repositories::{
    BrcRepository, CompanyRepository, ConversionRepository, EnquiryRepository,
    ExportOrderRepository, NumberingRepository, ProformaRepository, PurchaseOrderRepository,
    QuoteRepository, ShipmentRepository, ShippingBillRepository, StatsRepository,
};

use std::time::Duration;

use eximflow_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Opens a connection pool sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Opening database pool"
    );
    Database::connect(options).await
}
