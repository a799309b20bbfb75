//! Purchase order repository.
//!
//! Payment status is never written directly: it is derived from the total
//! and the sum of recorded payments every time a payment lands.

use chrono::{NaiveDate, Utc};
use eximflow_core::pricing::{
    LineItem, document_total, payment_amount, payment_status, price_lines,
};
use eximflow_core::workflow::{
    PaymentStatus, PurchaseOrderStatus, Transition, TransitionRequest, WorkflowAction,
    WorkflowService,
};
use eximflow_core::notify::WorkflowEvent;
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::{CompanyId, Currency, PageRequest, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{purchase_order_items, purchase_order_payments, purchase_orders};

use super::numbering::{NumberScope, insert_numbered};
use super::support::{
    DocumentFilter, ListPage, RepoOptions, begin_scoped, db_err, non_blank, repo_options,
    required, status_event, stored_status, timestamp,
};

/// Input for creating a purchase order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseOrderInput {
    /// Vendor name.
    pub vendor_name: String,
    /// Order currency.
    #[serde(default)]
    pub currency: Currency,
    /// Order date; defaults to today.
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    /// Order lines.
    pub items: Vec<LineItem>,
}

/// A payment made to the vendor.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderPaymentInput {
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date; defaults to today.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Bank or cheque reference.
    #[serde(default)]
    pub reference: Option<String>,
}

/// A purchase order with lines and payments.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetail {
    /// The order row.
    #[serde(flatten)]
    pub order: purchase_orders::Model,
    /// Lines in position order.
    pub items: Vec<purchase_order_items::Model>,
    /// Payments, oldest first.
    pub payments: Vec<purchase_order_payments::Model>,
}

async fn find_purchase_order<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<purchase_orders::Model, WorkflowError> {
    let mut query = purchase_orders::Entity::find_by_id(id)
        .filter(purchase_orders::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("purchase order", id))
}

async fn load_payments<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Vec<purchase_order_payments::Model>, WorkflowError> {
    purchase_order_payments::Entity::find()
        .filter(purchase_order_payments::Column::PurchaseOrderId.eq(order_id))
        .order_by_asc(purchase_order_payments::Column::PaymentDate)
        .order_by_asc(purchase_order_payments::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)
}

fn stamp(active: &mut purchase_orders::ActiveModel, t: &Transition<PurchaseOrderStatus>) {
    let at = timestamp(t.at);
    active.status = Set(t.to.as_str().to_string());
    match t.action {
        WorkflowAction::Submit => {
            active.submitted_by = Set(Some(t.actor));
            active.submitted_at = Set(Some(at));
        }
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

/// Paid amount and status after a full payment history.
fn settle(total: Decimal, payments: &[Decimal]) -> (Decimal, PaymentStatus) {
    let paid: Decimal = payments.iter().copied().sum();
    (paid, payment_status(total, paid))
}

/// Purchase order repository.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(PurchaseOrderRepository);

impl PurchaseOrderRepository {
    /// Creates a new purchase order repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Creates a draft purchase order with a fresh `PO` number.
    ///
    /// # Errors
    ///
    /// * `Validation` if the vendor is blank or the lines are invalid.
    /// * `NumberingConflict` if no unique number could be allocated.
    pub async fn create(
        &self,
        company_id: CompanyId,
        actor: UserId,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderDetail, WorkflowError> {
        let vendor_name = required(&input.vendor_name, "Vendor name")?;
        price_lines(&input.items)?;
        let lines: Vec<LineItem> = input
            .items
            .iter()
            .map(LineItem::with_discount_applied)
            .collect();
        let total = document_total(&lines)?;
        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let txn = begin_scoped(&self.db, company_id).await?;
        let now = timestamp(Utc::now());
        let id = Uuid::new_v4();

        let order = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::PurchaseOrder),
            self.options.workflow.numbering_retry_budget,
            |number| purchase_orders::ActiveModel {
                id: Set(id),
                company_id: Set(company_id.into_inner()),
                po_number: Set(number),
                status: Set(PurchaseOrderStatus::Draft.as_str().to_string()),
                payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
                vendor_name: Set(vendor_name.clone()),
                currency: Set(input.currency.code().to_string()),
                order_date: Set(order_date),
                total_amount: Set(total),
                paid_amount: Set(Decimal::ZERO),
                submitted_by: Set(None),
                submitted_at: Set(None),
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

        let mut items = Vec::with_capacity(lines.len());
        for (position, line) in (1..).zip(&lines) {
            let item = purchase_order_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(id),
                position: Set(position),
                sku_id: Set(line.sku_id),
                description: Set(line.description.trim().to_string()),
                quantity: Set(line.quantity),
                unit: Set(line.unit.clone()),
                unit_price: Set(line.unit_price),
                tax_percent: Set(line.tax_percent),
                line_total: Set(line.line_total()?),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            items.push(item);
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            purchase_order_id = %id,
            number = %order.po_number,
            total = %total,
            "Purchase order created"
        );
        Ok(PurchaseOrderDetail {
            order,
            items,
            payments: Vec::new(),
        })
    }

    /// Gets a purchase order with its lines and payments.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order does not exist in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        id: Uuid,
    ) -> Result<PurchaseOrderDetail, WorkflowError> {
        let order = find_purchase_order(&self.db, company_id, id, false).await?;
        let items = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::PurchaseOrderId.eq(id))
            .order_by_asc(purchase_order_items::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let payments = load_payments(&self.db, id).await?;
        Ok(PurchaseOrderDetail {
            order,
            items,
            payments,
        })
    }

    /// Lists purchase orders, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not a purchase order status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &DocumentFilter,
        page: &PageRequest,
    ) -> Result<ListPage<purchase_orders::Model>, WorkflowError> {
        let mut query = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(status) = filter.parsed_status::<PurchaseOrderStatus>()? {
            query = query.filter(purchase_orders::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_desc(purchase_orders::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Submits a draft order for approval.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the order is a draft.
    pub async fn submit(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<purchase_orders::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Submit, actor.into_inner()),
        )
        .await
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
    ) -> Result<purchase_orders::Model, WorkflowError> {
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
    ) -> Result<purchase_orders::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Reject, actor.into_inner()).with_reason(reason),
        )
        .await
    }

    /// Marks an order as ordered, received or cancelled.
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
    ) -> Result<purchase_orders::Model, WorkflowError> {
        let target: PurchaseOrderStatus = new_status.trim().parse()?;
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::UpdateStatus, actor.into_inner())
                .with_target(target),
        )
        .await
    }

    /// Records a vendor payment and recomputes the paid amount and payment
    /// status from the full payment history.
    ///
    /// The amount is rounded to cents before it is stored. Overpayment is
    /// accepted and reported as paid.
    ///
    /// # Errors
    ///
    /// * `Validation` if the amount is not positive once rounded.
    /// * `NotFound` if the order does not exist in the company.
    pub async fn record_payment(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        input: PurchaseOrderPaymentInput,
    ) -> Result<PurchaseOrderDetail, WorkflowError> {
        let amount = payment_amount(input.amount)?;

        let txn = begin_scoped(&self.db, company_id).await?;
        let order = find_purchase_order(&txn, company_id, id, true).await?;
        let now = Utc::now();

        purchase_order_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(id),
            amount: Set(amount),
            payment_date: Set(input.payment_date.unwrap_or_else(|| now.date_naive())),
            reference: Set(non_blank(input.reference)),
            created_by: Set(actor.into_inner()),
            created_at: Set(timestamp(now)),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let payments = load_payments(&txn, id).await?;
        let amounts: Vec<Decimal> = payments.iter().map(|p| p.amount).collect();
        let (paid, status) = settle(order.total_amount, &amounts);

        let mut active: purchase_orders::ActiveModel = order.into();
        active.paid_amount = Set(paid);
        active.payment_status = Set(status.as_str().to_string());
        active.updated_at = Set(timestamp(now));
        let order = active.update(&txn).await.map_err(db_err)?;

        let items = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::PurchaseOrderId.eq(id))
            .order_by_asc(purchase_order_items::Column::Position)
            .all(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            purchase_order_id = %id,
            amount = %amount,
            paid = %paid,
            payment_status = %status,
            "Purchase order payment recorded"
        );
        self.options.publish(&WorkflowEvent::PaymentRecorded {
            company_id: company_id.into_inner(),
            entity: "purchase_order",
            id,
            amount,
            status: status.to_string(),
        });
        Ok(PurchaseOrderDetail {
            order,
            items,
            payments,
        })
    }

    async fn transition(
        &self,
        company_id: CompanyId,
        id: Uuid,
        request: TransitionRequest<PurchaseOrderStatus>,
    ) -> Result<purchase_orders::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let order = find_purchase_order(&txn, company_id, id, true).await?;
        let current: PurchaseOrderStatus = stored_status(&order.status)?;
        let transition = WorkflowService::apply(current, request, Utc::now())?;

        let number = order.po_number.clone();
        let mut active: purchase_orders::ActiveModel = order.into();
        stamp(&mut active, &transition);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            purchase_order_id = %id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "Purchase order transitioned"
        );
        self.options
            .publish(&status_event(company_id, id, &number, &transition));
        Ok(updated)
    }
}
