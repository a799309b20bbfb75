//! Per-document-type statistics.
//!
//! Postgres groups the documents by status, creation day and conversion
//! flag; the core `StatsService` folds the groups into buckets and a trend.

use chrono::NaiveDate;
use eximflow_core::stats::{DocumentStats, StatRow, StatsService};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::CompanyId;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};

use super::numbering::number_column;
use super::support::{begin_scoped, db_err};

/// Value column and conversion marker of a document table.
const fn stat_columns(document: DocumentType) -> (&'static str, &'static str) {
    match document {
        DocumentType::Enquiry => ("0", "quote_id IS NOT NULL"),
        DocumentType::Quote => ("total_amount", "proforma_invoice_id IS NOT NULL"),
        DocumentType::ProformaInvoice => (
            "total_amount",
            "(invoice_type = 'commercial' OR export_order_id IS NOT NULL)",
        ),
        DocumentType::ShippingBill => ("fob_value", "FALSE"),
        DocumentType::ExportOrder | DocumentType::PurchaseOrder => ("total_amount", "FALSE"),
    }
}

fn stats_sql(document: DocumentType) -> String {
    let (table, _) = number_column(document);
    let (amount, converted) = stat_columns(document);
    format!(
        "SELECT status, (created_at AT TIME ZONE 'UTC')::DATE AS day, {converted} AS converted, \
         COUNT(*) AS count, COALESCE(SUM({amount}), 0)::NUMERIC AS amount \
         FROM {table} WHERE company_id = $1 GROUP BY 1, 2, 3"
    )
}

/// Statistics repository.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db: DatabaseConnection,
}

impl StatsRepository {
    /// Creates a new statistics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Aggregates every document of `document` in the company.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` if the query fails.
    pub async fn stats(
        &self,
        company_id: CompanyId,
        document: DocumentType,
    ) -> Result<DocumentStats, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            stats_sql(document),
            [company_id.into_inner().into()],
        );
        let rows = txn.query_all(stmt).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        let mut stat_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.try_get("", "count").map_err(db_err)?;
            stat_rows.push(StatRow {
                status: row.try_get("", "status").map_err(db_err)?,
                day: row.try_get::<NaiveDate>("", "day").map_err(db_err)?,
                converted: row.try_get("", "converted").map_err(db_err)?,
                count: u64::try_from(count)
                    .map_err(|_| WorkflowError::Database(format!("Negative count {count}")))?,
                amount: row.try_get::<Decimal>("", "amount").map_err(db_err)?,
            });
        }

        tracing::debug!(
            company_id = %company_id,
            document = %document,
            groups = stat_rows.len(),
            "Loaded statistics groups"
        );
        Ok(StatsService::summarize(document, &stat_rows))
    }
}
