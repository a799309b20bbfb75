//! Export order repository.

use chrono::{NaiveDate, Utc};
use eximflow_core::pricing::{LineItem, price_lines};
use eximflow_core::workflow::{
    ExportOrderStatus, Transition, TransitionRequest, WorkflowAction, WorkflowService,
};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::{CompanyId, Currency, PageRequest, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{export_order_items, export_orders};

use super::numbering::{NumberScope, insert_numbered};
use super::support::{
    DocumentFilter, ListPage, RepoOptions, begin_scoped, db_err, repo_options, required,
    status_event, stored_status, timestamp,
};

/// Input for creating an export order directly, without a proforma invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExportOrderInput {
    /// Buyer name.
    pub buyer_name: String,
    /// Order currency.
    #[serde(default)]
    pub currency: Currency,
    /// Order date; defaults to today.
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    /// Order lines. Discounts are folded into the unit price.
    pub items: Vec<LineItem>,
}

/// An export order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOrderDetail {
    /// The order row.
    #[serde(flatten)]
    pub order: export_orders::Model,
    /// Lines in position order.
    pub items: Vec<export_order_items::Model>,
}

pub(crate) async fn find_order<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<export_orders::Model, WorkflowError> {
    let mut query = export_orders::Entity::find_by_id(id)
        .filter(export_orders::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("export order", id))
}

pub(crate) async fn load_order_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Vec<export_order_items::Model>, WorkflowError> {
    export_order_items::Entity::find()
        .filter(export_order_items::Column::ExportOrderId.eq(order_id))
        .order_by_asc(export_order_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Inserts order lines. The stored line total keeps tax.
pub(crate) async fn insert_order_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    lines: &[LineItem],
) -> Result<Vec<export_order_items::Model>, WorkflowError> {
    let mut items = Vec::with_capacity(lines.len());
    for (position, line) in (1..).zip(lines) {
        let line = line.with_discount_applied();
        let item = export_order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            export_order_id: Set(order_id),
            position: Set(position),
            sku_id: Set(line.sku_id),
            description: Set(line.description.trim().to_string()),
            hsn_code: Set(line.hsn_code.clone()),
            quantity: Set(line.quantity),
            unit: Set(line.unit.clone()),
            unit_price: Set(line.unit_price),
            line_total: Set(line.line_total()?),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
        items.push(item);
    }
    Ok(items)
}

/// Sum of stored line totals.
pub(crate) fn items_total(items: &[export_order_items::Model]) -> Decimal {
    items.iter().map(|i| i.line_total).sum()
}

fn stamp(active: &mut export_orders::ActiveModel, t: &Transition<ExportOrderStatus>) {
    let at = timestamp(t.at);
    active.status = Set(t.to.as_str().to_string());
    match t.action {
        WorkflowAction::Approve => {
            active.approved_by = Set(Some(t.actor));
            active.approved_at = Set(Some(at));
        }
        WorkflowAction::Reject => {
            active.rejected_by = Set(Some(t.actor));
            active.rejected_at = Set(Some(at));
            active.rejection_reason = Set(t.reason.clone());
        }
        _ => {}
    }
    active.updated_at = Set(at);
}

/// Export order repository.
#[derive(Debug, Clone)]
pub struct ExportOrderRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(ExportOrderRepository);

impl ExportOrderRepository {
    /// Creates a new export order repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Creates a pending export order with a fresh `EO` number.
    ///
    /// # Errors
    ///
    /// * `Validation` if the buyer is blank or the lines are invalid.
    /// * `NumberingConflict` if no unique number could be allocated.
    pub async fn create(
        &self,
        company_id: CompanyId,
        actor: UserId,
        input: CreateExportOrderInput,
    ) -> Result<ExportOrderDetail, WorkflowError> {
        let buyer_name = required(&input.buyer_name, "Buyer name")?;
        price_lines(&input.items)?;
        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let txn = begin_scoped(&self.db, company_id).await?;
        let now = timestamp(Utc::now());
        let id = Uuid::new_v4();

        let order = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::ExportOrder),
            self.options.workflow.numbering_retry_budget,
            |number| export_orders::ActiveModel {
                id: Set(id),
                company_id: Set(company_id.into_inner()),
                order_number: Set(number),
                status: Set(ExportOrderStatus::Pending.as_str().to_string()),
                proforma_invoice_id: Set(None),
                buyer_name: Set(buyer_name.clone()),
                currency: Set(input.currency.code().to_string()),
                order_date: Set(order_date),
                total_amount: Set(Decimal::ZERO),
                approved_by: Set(None),
                approved_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(now),
                updated_at: Set(now),
            },
        )
        .await?;
        let items = insert_order_items(&txn, id, &input.items).await?;

        let mut active: export_orders::ActiveModel = order.into();
        active.total_amount = Set(items_total(&items));
        let order = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            order_id = %id,
            number = %order.order_number,
            "Export order created"
        );
        Ok(ExportOrderDetail { order, items })
    }

    /// Gets an export order with its lines.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order does not exist in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        id: Uuid,
    ) -> Result<ExportOrderDetail, WorkflowError> {
        let order = find_order(&self.db, company_id, id, false).await?;
        let items = load_order_items(&self.db, id).await?;
        Ok(ExportOrderDetail { order, items })
    }

    /// Lists export orders, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not an export order status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &DocumentFilter,
        page: &PageRequest,
    ) -> Result<ListPage<export_orders::Model>, WorkflowError> {
        let mut query = export_orders::Entity::find()
            .filter(export_orders::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(status) = filter.parsed_status::<ExportOrderStatus>()? {
            query = query.filter(export_orders::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_desc(export_orders::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Approves a pending order.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the order is pending.
    pub async fn approve(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<export_orders::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Approve, actor.into_inner()),
        )
        .await
    }

    /// Rejects a pending order.
    ///
    /// # Errors
    ///
    /// `Validation` if the reason is blank, `InvalidState` unless pending.
    pub async fn reject(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        reason: &str,
    ) -> Result<export_orders::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Reject, actor.into_inner()).with_reason(reason),
        )
        .await
    }

    /// Moves an order along its fulfilment chain, or cancels it.
    ///
    /// # Errors
    ///
    /// `Validation` for an unknown status, `InvalidState` when the move is not
    /// allowed from the current status.
    pub async fn update_status(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        new_status: &str,
    ) -> Result<export_orders::Model, WorkflowError> {
        let target: ExportOrderStatus = new_status.trim().parse()?;
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::UpdateStatus, actor.into_inner())
                .with_target(target),
        )
        .await
    }

    async fn transition(
        &self,
        company_id: CompanyId,
        id: Uuid,
        request: TransitionRequest<ExportOrderStatus>,
    ) -> Result<export_orders::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let order = find_order(&txn, company_id, id, true).await?;
        let current: ExportOrderStatus = stored_status(&order.status)?;
        let transition = WorkflowService::apply(current, request, Utc::now())?;

        let number = order.order_number.clone();
        let mut active: export_orders::ActiveModel = order.into();
        stamp(&mut active, &transition);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            order_id = %id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "Export order transitioned"
        );
        self.options
            .publish(&status_event(company_id, id, &number, &transition));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(line_total: Decimal) -> export_order_items::Model {
        export_order_items::Model {
            id: Uuid::new_v4(),
            export_order_id: Uuid::new_v4(),
            position: 1,
            sku_id: None,
            description: "Granite slabs".to_string(),
            hsn_code: None,
            quantity: dec!(1),
            unit: "pcs".to_string(),
            unit_price: line_total,
            line_total,
        }
    }

    #[test]
    fn test_items_total() {
        assert_eq!(items_total(&[]), Decimal::ZERO);
        assert_eq!(items_total(&[item(dec!(10.50)), item(dec!(4.25))]), dec!(14.75));
    }

    #[test]
    fn test_reject_stamp_records_reason() {
        let now = Utc::now();
        let order = export_orders::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            order_number: "EO-2025-001".to_string(),
            status: "pending".to_string(),
            proforma_invoice_id: None,
            buyer_name: "Acme GmbH".to_string(),
            currency: "EUR".to_string(),
            order_date: now.date_naive(),
            total_amount: dec!(100),
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            created_by: Uuid::new_v4(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        let actor = Uuid::new_v4();
        let t = WorkflowService::reject(ExportOrderStatus::Pending, actor, "Buyer withdrew", now)
            .unwrap();
        let mut active: export_orders::ActiveModel = order.into();
        stamp(&mut active, &t);
        assert_eq!(active.status, Set("rejected".to_string()));
        assert_eq!(active.rejected_by, Set(Some(actor)));
        assert_eq!(active.rejection_reason, Set(Some("Buyer withdrew".to_string())));
    }
}
