//! Row-Level Security (RLS) context management.
//!
//! Repositories open one transaction per unit of work and set
//! `app.current_company_id` on it before touching tenant tables, so the
//! policies installed by the initial migration apply to every query.
//!
//! # Usage
//!
//! ```ignore
//! use eximflow_db::rls::RlsConnection;
//!
//! let rls = RlsConnection::new(&db, company_id).await?;
//! let quotes = Quotes::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use eximflow_shared::types::CompanyId;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

/// A transaction with the company context already set.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and scopes it to `company_id` with `SET LOCAL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn new(db: &DatabaseConnection, company_id: CompanyId) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, company_id).await?;
        Ok(Self { txn })
    }

    /// The underlying transaction.
    #[must_use]
    pub const fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to open company-scoped transactions.
#[async_trait::async_trait]
pub trait RlsExt {
    /// Opens a transaction scoped to `company_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the RLS connection cannot be created.
    async fn with_rls(&self, company_id: CompanyId) -> Result<RlsConnection, DbErr>;
}

#[async_trait::async_trait]
impl RlsExt for DatabaseConnection {
    async fn with_rls(&self, company_id: CompanyId) -> Result<RlsConnection, DbErr> {
        RlsConnection::new(self, company_id).await
    }
}

fn context_sql(company_id: CompanyId) -> String {
    // a Uuid renders as hex and dashes only, so inlining it is safe
    format!("SET LOCAL app.current_company_id = '{company_id}'")
}

/// Sets the company context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the RLS context cannot be set.
pub async fn set_rls_context(txn: &DatabaseTransaction, company_id: CompanyId) -> Result<(), DbErr> {
    txn.execute_unprepared(&context_sql(company_id)).await?;
    Ok(())
}
