//! BRC repository.
//!
//! Pending amount, realization status and the overdue flag are derived
//! columns. They are recomputed from the full payment history under a row
//! lock whenever a payment lands.

use chrono::{DateTime, NaiveDate, Utc};
use eximflow_core::WorkflowError;
use eximflow_core::brc::{BrcService, BrcSummary, ComplianceSnapshot, PaymentRequest};
use eximflow_core::notify::WorkflowEvent;
use eximflow_core::workflow::{RealizationStatus, ShippingBillStatus};
use eximflow_shared::types::{CompanyId, Currency, PageRequest, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{brc_payments, brcs};
use crate::rls::set_rls_context;

use super::shipping_bill::find_bill;
use super::support::{
    ListPage, RepoOptions, begin_scoped, db_err, is_unique_violation, non_blank, repo_options,
    stored_status, timestamp,
};

/// Input for opening a BRC against a shipping bill.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBrcInput {
    /// The shipping bill being realized.
    pub shipping_bill_id: Uuid,
    /// Amount expected from the buyer.
    pub total_expected: Decimal,
    /// Realization deadline.
    pub due_date: NaiveDate,
    /// Bank reference, if already issued.
    #[serde(default)]
    pub brc_number: Option<String>,
    /// Currency; defaults to the shipping bill's.
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Filters for listing BRCs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrcFilter {
    /// Only BRCs in this realization status.
    #[serde(default)]
    pub status: Option<String>,
    /// Only BRCs flagged overdue.
    #[serde(default)]
    pub overdue: Option<bool>,
}

/// A BRC with its payments.
#[derive(Debug, Clone, Serialize)]
pub struct BrcDetail {
    /// The BRC row.
    #[serde(flatten)]
    pub brc: brcs::Model,
    /// Payments, oldest first.
    pub payments: Vec<brc_payments::Model>,
}

fn parse_realization(raw: &str) -> Result<RealizationStatus, WorkflowError> {
    RealizationStatus::parse(raw).ok_or_else(|| {
        WorkflowError::Database(format!("Unknown realization status '{raw}' in storage"))
    })
}

fn summary(row: &brcs::Model) -> Result<BrcSummary, WorkflowError> {
    Ok(BrcSummary {
        id: row.id,
        brc_number: row.brc_number.clone(),
        shipping_bill_id: row.shipping_bill_id,
        total_expected: row.total_expected,
        pending_amount: row.pending_amount,
        currency: row.currency.clone(),
        due_date: row.due_date,
        status: parse_realization(&row.realization_status)?,
    })
}

async fn find_brc<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<brcs::Model, WorkflowError> {
    let mut query =
        brcs::Entity::find_by_id(id).filter(brcs::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("brc", id))
}

async fn load_payments<C: ConnectionTrait>(
    conn: &C,
    brc_id: Uuid,
) -> Result<Vec<brc_payments::Model>, WorkflowError> {
    brc_payments::Entity::find()
        .filter(brc_payments::Column::BrcId.eq(brc_id))
        .order_by_asc(brc_payments::Column::PaymentDate)
        .order_by_asc(brc_payments::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)
}

/// BRC repository.
#[derive(Debug, Clone)]
pub struct BrcRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(BrcRepository);

impl BrcRepository {
    /// Creates a new BRC repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Opens a BRC against a filed shipping bill.
    ///
    /// # Errors
    ///
    /// * `Validation` if the expected amount is not positive or the BRC
    ///   number is already used in the company.
    /// * `NotFound` if the shipping bill does not exist in the company.
    /// * `InvalidState` unless the bill is filed, cleared or shipped.
    pub async fn create(
        &self,
        company_id: CompanyId,
        actor: UserId,
        input: CreateBrcInput,
    ) -> Result<BrcDetail, WorkflowError> {
        if input.total_expected <= Decimal::ZERO {
            return Err(WorkflowError::validation("Expected amount must be positive"));
        }

        let txn = begin_scoped(&self.db, company_id).await?;
        let bill = find_bill(&txn, company_id, input.shipping_bill_id, false).await?;
        let bill_status: ShippingBillStatus = stored_status(&bill.status)?;
        BrcService::ensure_bill_realizable(bill_status)?;

        let now = Utc::now();
        let realization = BrcService::realization(input.total_expected, &[]);
        let currency = input
            .currency
            .map_or_else(|| bill.currency.clone(), |c| c.code().to_string());

        let brc = brcs::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id.into_inner()),
            shipping_bill_id: Set(bill.id),
            brc_number: Set(non_blank(input.brc_number)),
            currency: Set(currency),
            total_expected: Set(input.total_expected),
            pending_amount: Set(realization.pending_amount),
            realization_status: Set(realization.status.as_str().to_string()),
            due_date: Set(input.due_date),
            is_overdue: Set(BrcService::is_overdue(
                input.due_date,
                realization.status,
                now.date_naive(),
            )),
            created_by: Set(actor.into_inner()),
            created_at: Set(timestamp(now)),
            updated_at: Set(timestamp(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                WorkflowError::validation("BRC number already exists")
            } else {
                db_err(e)
            }
        })?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            brc_id = %brc.id,
            shipping_bill = %bill.sb_number,
            total_expected = %brc.total_expected,
            "BRC created"
        );
        Ok(BrcDetail {
            brc,
            payments: Vec::new(),
        })
    }

    /// Gets a BRC with its payments.
    ///
    /// # Errors
    ///
    /// `NotFound` if the BRC does not exist in the company.
    pub async fn get(&self, company_id: CompanyId, id: Uuid) -> Result<BrcDetail, WorkflowError> {
        let brc = find_brc(&self.db, company_id, id, false).await?;
        let payments = load_payments(&self.db, id).await?;
        Ok(BrcDetail { brc, payments })
    }

    /// Lists BRCs by due date, soonest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not a realization status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &BrcFilter,
        page: &PageRequest,
    ) -> Result<ListPage<brcs::Model>, WorkflowError> {
        let mut query =
            brcs::Entity::find().filter(brcs::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(raw) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status: RealizationStatus = raw.trim().parse()?;
            query = query.filter(brcs::Column::RealizationStatus.eq(status.as_str()));
        }
        if let Some(overdue) = filter.overdue {
            query = query.filter(brcs::Column::IsOverdue.eq(overdue));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_asc(brcs::Column::DueDate)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Records a realized payment.
    ///
    /// The BRC row stays locked from the pending check through the
    /// recomputation, so concurrent payments cannot together exceed the
    /// expected total.
    ///
    /// # Errors
    ///
    /// * `Validation` if amount or date is missing, the amount is not
    ///   positive, or the exchange rate is not positive.
    /// * `AmountExceedsPending` if the amount is above what is pending.
    /// * `NotFound` if the BRC does not exist in the company.
    pub async fn record_payment(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        request: PaymentRequest,
    ) -> Result<BrcDetail, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let brc = find_brc(&txn, company_id, id, true).await?;
        let payment = BrcService::validate_payment(&request, brc.pending_amount)?;
        let now = Utc::now();

        brc_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            brc_id: Set(id),
            amount: Set(payment.amount),
            payment_date: Set(payment.payment_date),
            reference: Set(payment.reference.clone()),
            exchange_rate: Set(payment.exchange_rate),
            inr_amount: Set(payment.inr_amount),
            created_by: Set(actor.into_inner()),
            created_at: Set(timestamp(now)),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let payments = load_payments(&txn, id).await?;
        let amounts: Vec<Decimal> = payments.iter().map(|p| p.amount).collect();
        let realization = BrcService::realization(brc.total_expected, &amounts);
        let overdue = BrcService::is_overdue(brc.due_date, realization.status, now.date_naive());

        let mut active: brcs::ActiveModel = brc.into();
        active.pending_amount = Set(realization.pending_amount);
        active.realization_status = Set(realization.status.as_str().to_string());
        active.is_overdue = Set(overdue);
        active.updated_at = Set(timestamp(now));
        let brc = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            brc_id = %id,
            amount = %payment.amount,
            pending = %realization.pending_amount,
            status = %realization.status,
            "BRC payment recorded"
        );
        self.options.publish(&WorkflowEvent::PaymentRecorded {
            company_id: company_id.into_inner(),
            entity: "brc",
            id,
            amount: payment.amount,
            status: realization.status.to_string(),
        });
        Ok(BrcDetail { brc, payments })
    }

    /// Compliance view of every BRC in the company as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` if the query fails.
    pub async fn compliance(
        &self,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> Result<ComplianceSnapshot, WorkflowError> {
        let rows = brcs::Entity::find()
            .filter(brcs::Column::CompanyId.eq(company_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let summaries = rows.iter().map(summary).collect::<Result<Vec<_>, _>>()?;
        Ok(BrcService::compliance_snapshot(
            &summaries,
            now,
            self.options.workflow.brc_upcoming_window_days,
        ))
    }

    /// Brings the stored overdue flag in line with `today`.
    ///
    /// Sets the flag on BRCs past due and not fully realized, and clears it
    /// everywhere else. Running it twice on the same day changes nothing.
    /// `None` sweeps every company.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` if an update fails.
    pub async fn flag_overdue(
        &self,
        company_id: Option<CompanyId>,
        today: NaiveDate,
    ) -> Result<u64, WorkflowError> {
        let full = RealizationStatus::Full.as_str();
        let txn = self.db.begin().await.map_err(db_err)?;
        let scope = match company_id {
            Some(company_id) => {
                set_rls_context(&txn, company_id).await.map_err(db_err)?;
                Condition::all().add(brcs::Column::CompanyId.eq(company_id.into_inner()))
            }
            None => Condition::all(),
        };

        let flagged = brcs::Entity::update_many()
            .col_expr(brcs::Column::IsOverdue, Expr::value(true))
            .filter(scope.clone())
            .filter(brcs::Column::IsOverdue.eq(false))
            .filter(brcs::Column::DueDate.lt(today))
            .filter(brcs::Column::RealizationStatus.ne(full))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let cleared = brcs::Entity::update_many()
            .col_expr(brcs::Column::IsOverdue, Expr::value(false))
            .filter(scope)
            .filter(brcs::Column::IsOverdue.eq(true))
            .filter(
                Condition::any()
                    .add(brcs::Column::DueDate.gte(today))
                    .add(brcs::Column::RealizationStatus.eq(full)),
            )
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        let changed = flagged.rows_affected + cleared.rows_affected;
        if changed > 0 {
            tracing::info!(
                flagged = flagged.rows_affected,
                cleared = cleared.rows_affected,
                %today,
                "Refreshed BRC overdue flags"
            );
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(status: &str) -> brcs::Model {
        let now = Utc::now().into();
        brcs::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            shipping_bill_id: Uuid::new_v4(),
            brc_number: Some("BRC/HDFC/0042".to_string()),
            currency: "USD".to_string(),
            total_expected: dec!(10000),
            pending_amount: dec!(4000),
            realization_status: status.to_string(),
            due_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            is_overdue: false,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_summary_from_row() {
        let s = summary(&row("partial")).unwrap();
        assert_eq!(s.status, RealizationStatus::Partial);
        assert_eq!(s.pending_amount, dec!(4000));
        assert_eq!(s.brc_number.as_deref(), Some("BRC/HDFC/0042"));
    }

    #[test]
    fn test_summary_rejects_unknown_status() {
        assert!(matches!(summary(&row("settled")), Err(WorkflowError::Database(_))));
    }

    #[test]
    fn test_create_input_currency_is_optional() {
        let bill = Uuid::new_v4();
        let input: CreateBrcInput = serde_json::from_str(&format!(
            r#"{{"shipping_bill_id": "{bill}", "total_expected": "2500.00", "due_date": "2025-09-30"}}"#
        ))
        .unwrap();
        assert!(input.currency.is_none());
        assert!(input.brc_number.is_none());
        assert_eq!(input.total_expected, dec!(2500.00));
    }
}
