//! Document number allocation.
//!
//! Each (company, document type, year) scope has one counter row in
//! `document_sequences`. Allocation is a single upsert that takes the row
//! lock, so concurrent callers in the same scope are serialized by the
//! database. The counter never falls behind numbers that already exist: the
//! most recently created number of the scope acts as a floor, which covers
//! rows written before the counter existed.
//!
//! The unique constraint on every document table is the last line: an insert
//! that still collides is retried inside a savepoint with a fresh number.

use chrono::{Datelike, Utc};
use eximflow_core::numbering::{DocumentNumber, legacy_floor, scope_pattern};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::CompanyId;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, IntoActiveModel, Statement, TransactionTrait,
};

use super::support::{begin_scoped, db_err, is_unique_violation};

/// The table and column holding numbers of a document type.
#[must_use]
pub const fn number_column(document: DocumentType) -> (&'static str, &'static str) {
    match document {
        DocumentType::Enquiry => ("enquiries", "enquiry_number"),
        DocumentType::Quote => ("quotes", "quote_number"),
        DocumentType::ProformaInvoice => ("proforma_invoices", "invoice_number"),
        DocumentType::ExportOrder => ("export_orders", "order_number"),
        DocumentType::ShippingBill => ("shipping_bills", "sb_number"),
        DocumentType::PurchaseOrder => ("purchase_orders", "po_number"),
    }
}

const UPSERT_SEQUENCE_SQL: &str = r"
INSERT INTO document_sequences (company_id, document_type, year, last_value)
VALUES ($1, $2, $3, $4 + 1)
ON CONFLICT (company_id, document_type, year)
DO UPDATE SET last_value = GREATEST(document_sequences.last_value, $4) + 1
RETURNING last_value
";

fn latest_number_sql(document: DocumentType) -> String {
    let (table, column) = number_column(document);
    format!(
        "SELECT {column} AS number FROM {table} \
         WHERE company_id = $1 AND {column} LIKE $2 \
         ORDER BY created_at DESC LIMIT 1"
    )
}

/// The scope a number is allocated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberScope {
    /// Owning company.
    pub company_id: CompanyId,
    /// Document type.
    pub document: DocumentType,
    /// Calendar year.
    pub year: i32,
}

impl NumberScope {
    /// Scope for `document` in the current UTC year.
    #[must_use]
    pub fn current(company_id: CompanyId, document: DocumentType) -> Self {
        Self {
            company_id,
            document,
            year: Utc::now().year(),
        }
    }
}

/// Sequence of the most recently created number in the scope, or 0.
async fn floor<C: ConnectionTrait>(conn: &C, scope: NumberScope) -> Result<u64, WorkflowError> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        latest_number_sql(scope.document),
        [
            scope.company_id.into_inner().into(),
            scope_pattern(scope.document, scope.year).into(),
        ],
    );
    let latest = match conn.query_one(stmt).await.map_err(db_err)? {
        Some(row) => Some(row.try_get::<String>("", "number").map_err(db_err)?),
        None => None,
    };
    Ok(legacy_floor(scope.document, scope.year, latest.as_deref()))
}

/// Advances the scope's counter and returns the allocated number.
///
/// Runs on the caller's connection; inside a transaction the counter row
/// stays locked until commit.
///
/// # Errors
///
/// Returns `WorkflowError::Database` if a query fails.
pub async fn allocate<C: ConnectionTrait>(
    conn: &C,
    scope: NumberScope,
) -> Result<DocumentNumber, WorkflowError> {
    let floor = floor(conn, scope).await?;
    let floor = i64::try_from(floor)
        .map_err(|_| WorkflowError::Database("Sequence floor out of range".to_string()))?;

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        UPSERT_SEQUENCE_SQL,
        [
            scope.company_id.into_inner().into(),
            scope.document.as_str().into(),
            scope.year.into(),
            floor.into(),
        ],
    );
    let row = conn
        .query_one(stmt)
        .await
        .map_err(db_err)?
        .ok_or_else(|| WorkflowError::Database("Sequence upsert returned no row".to_string()))?;
    let last_value: i64 = row.try_get("", "last_value").map_err(db_err)?;
    let sequence = u64::try_from(last_value)
        .map_err(|_| WorkflowError::Database(format!("Negative sequence {last_value}")))?;

    Ok(DocumentNumber::new(scope.document, scope.year, sequence))
}

/// Inserts a numbered row, retrying with a fresh number on collision.
///
/// `build` receives the allocated number and returns the row to insert. Each
/// attempt runs in a savepoint so a failed insert does not poison `txn`.
///
/// # Errors
///
/// * `WorkflowError::NumberingConflict` once `retry_budget` attempts collided.
/// * `WorkflowError::Database` for any other failure.
pub async fn insert_numbered<A, F>(
    txn: &DatabaseTransaction,
    scope: NumberScope,
    retry_budget: u32,
    mut build: F,
) -> Result<<A::Entity as EntityTrait>::Model, WorkflowError>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    F: FnMut(String) -> A,
{
    let attempts = retry_budget.max(1);
    for attempt in 1..=attempts {
        let number = allocate(txn, scope).await?.to_string();
        let savepoint = txn.begin().await.map_err(db_err)?;
        match build(number.clone()).insert(&savepoint).await {
            Ok(model) => {
                savepoint.commit().await.map_err(db_err)?;
                return Ok(model);
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await.map_err(db_err)?;
                tracing::warn!(
                    document = %scope.document,
                    number = %number,
                    attempt,
                    "Document number collided, retrying"
                );
            }
            Err(err) => return Err(db_err(err)),
        }
    }

    tracing::error!(document = %scope.document, attempts, "Numbering retry budget exhausted");
    Err(WorkflowError::NumberingConflict {
        document: scope.document,
        attempts,
    })
}

/// Repository for standalone number allocation.
#[derive(Debug, Clone)]
pub struct NumberingRepository {
    db: DatabaseConnection,
}

impl NumberingRepository {
    /// Creates a new numbering repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Allocates the next number of `document` for `company_id` in `year`.
    ///
    /// The number is consumed even if the caller never uses it.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` if the allocation fails.
    pub async fn next_number(
        &self,
        company_id: CompanyId,
        document: DocumentType,
        year: i32,
    ) -> Result<String, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let number = allocate(
            &txn,
            NumberScope {
                company_id,
                document,
                year,
            },
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::debug!(company_id = %company_id, number = %number, "Allocated document number");
        Ok(number.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_document_has_a_number_column() {
        for document in DocumentType::ALL {
            let (table, column) = number_column(*document);
            assert!(!table.is_empty());
            assert!(column.ends_with("_number"), "{document}");
        }
    }

    #[test]
    fn test_latest_number_sql_targets_the_right_table() {
        assert_eq!(
            latest_number_sql(DocumentType::ProformaInvoice),
            "SELECT invoice_number AS number FROM proforma_invoices \
             WHERE company_id = $1 AND invoice_number LIKE $2 \
             ORDER BY created_at DESC LIMIT 1"
        );
    }

    #[test]
    fn test_upsert_never_goes_below_floor() {
        assert!(UPSERT_SEQUENCE_SQL.contains("GREATEST(document_sequences.last_value, $4) + 1"));
        assert!(UPSERT_SEQUENCE_SQL.contains("VALUES ($1, $2, $3, $4 + 1)"));
    }
}
