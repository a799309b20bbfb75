//! Proforma invoice repository.
//!
//! Proforma lines carry no discount column: a discounted line is stored with
//! the discount folded into its unit price.

use chrono::{NaiveDate, Utc};
use eximflow_core::pricing::{LineItem, document_total, price_lines};
use eximflow_core::render::DocumentSnapshot;
use eximflow_core::workflow::{
    InvoiceType, ProformaStatus, Transition, TransitionRequest, WorkflowAction, WorkflowService,
};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::{CompanyId, Currency, PageRequest, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{proforma_invoice_items, proforma_invoices};

use super::numbering::{NumberScope, insert_numbered};
use super::support::{
    DocumentFilter, ListPage, RepoOptions, begin_scoped, db_err, non_blank, repo_options,
    required, status_event, stored_status, timestamp,
};

/// Input for creating a proforma invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProformaInput {
    /// Buyer name.
    pub buyer_name: String,
    /// Buyer address.
    #[serde(default)]
    pub buyer_address: Option<String>,
    /// Invoice currency.
    #[serde(default)]
    pub currency: Currency,
    /// Issue date; defaults to today.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Priced lines.
    pub items: Vec<LineItem>,
}

/// A proforma invoice with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct ProformaDetail {
    /// The invoice row.
    #[serde(flatten)]
    pub invoice: proforma_invoices::Model,
    /// Lines in position order.
    pub items: Vec<proforma_invoice_items::Model>,
}

impl ProformaDetail {
    /// Lines as pricing input.
    #[must_use]
    pub fn lines(&self) -> Vec<LineItem> {
        self.items.iter().map(proforma_line).collect()
    }

    /// The read-only view handed to a renderer.
    ///
    /// # Errors
    ///
    /// `Database` if a stored status or invoice type no longer parses.
    pub fn snapshot(&self) -> Result<DocumentSnapshot, WorkflowError> {
        let invoice_type = InvoiceType::parse(&self.invoice.invoice_type).ok_or_else(|| {
            WorkflowError::Database(format!(
                "Unknown invoice type '{}' in storage",
                self.invoice.invoice_type
            ))
        })?;
        let status: ProformaStatus = stored_status(&self.invoice.status)?;
        Ok(DocumentSnapshot {
            document: DocumentType::ProformaInvoice,
            number: self.invoice.invoice_number.clone(),
            invoice_type: Some(invoice_type),
            status: status.to_string(),
            version: self.invoice.version,
            buyer_name: self.invoice.buyer_name.clone(),
            currency: self.invoice.currency.clone(),
            issue_date: self.invoice.issue_date,
            lines: self.lines(),
            total: self.invoice.total_amount,
        })
    }
}

pub(crate) fn proforma_line(item: &proforma_invoice_items::Model) -> LineItem {
    LineItem {
        sku_id: item.sku_id,
        description: item.description.clone(),
        hsn_code: item.hsn_code.clone(),
        quantity: item.quantity,
        unit: item.unit.clone(),
        unit_price: item.unit_price,
        discount_percent: rust_decimal::Decimal::ZERO,
        tax_percent: item.tax_percent,
        net_weight: item.net_weight,
        gross_weight: item.gross_weight,
    }
}

/// Loads a proforma invoice owned by `company_id`, optionally locking it.
pub(crate) async fn find_proforma<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<proforma_invoices::Model, WorkflowError> {
    let mut query = proforma_invoices::Entity::find_by_id(id)
        .filter(proforma_invoices::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("proforma invoice", id))
}

pub(crate) async fn load_proforma_items<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<Vec<proforma_invoice_items::Model>, WorkflowError> {
    proforma_invoice_items::Entity::find()
        .filter(proforma_invoice_items::Column::ProformaInvoiceId.eq(invoice_id))
        .order_by_asc(proforma_invoice_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Folds discounts into unit prices so the lines fit the proforma table.
pub(crate) fn proforma_lines(lines: &[LineItem]) -> Vec<LineItem> {
    lines.iter().map(LineItem::with_discount_applied).collect()
}

/// Inserts discount-free lines for `invoice_id`, in order.
pub(crate) async fn insert_proforma_items<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    lines: &[LineItem],
) -> Result<Vec<proforma_invoice_items::Model>, WorkflowError> {
    let mut items = Vec::with_capacity(lines.len());
    for (position, line) in (1..).zip(lines) {
        let item = proforma_invoice_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            proforma_invoice_id: Set(invoice_id),
            position: Set(position),
            sku_id: Set(line.sku_id),
            description: Set(line.description.trim().to_string()),
            hsn_code: Set(line.hsn_code.clone()),
            quantity: Set(line.quantity),
            unit: Set(line.unit.clone()),
            unit_price: Set(line.unit_price),
            tax_percent: Set(line.tax_percent),
            net_weight: Set(line.net_weight),
            gross_weight: Set(line.gross_weight),
            line_total: Set(line.line_total()?),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
        items.push(item);
    }
    Ok(items)
}

fn stamp(
    active: &mut proforma_invoices::ActiveModel,
    current_version: i32,
    t: &Transition<ProformaStatus>,
) {
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
    if t.bumps_version() {
        active.version = Set(current_version + 1);
        active.rejected_by = Set(None);
        active.rejected_at = Set(None);
        active.rejection_reason = Set(None);
    }
    active.updated_at = Set(at);
}

/// Proforma invoice repository.
#[derive(Debug, Clone)]
pub struct ProformaRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(ProformaRepository);

impl ProformaRepository {
    /// Creates a new proforma invoice repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Creates a draft proforma invoice with a fresh `PI` number.
    ///
    /// # Errors
    ///
    /// * `Validation` if the buyer is blank, there are no lines or a line is invalid.
    /// * `NumberingConflict` if no unique number could be allocated.
    pub async fn create(
        &self,
        company_id: CompanyId,
        actor: UserId,
        input: CreateProformaInput,
    ) -> Result<ProformaDetail, WorkflowError> {
        let buyer_name = required(&input.buyer_name, "Buyer name")?;
        price_lines(&input.items)?;
        let lines = proforma_lines(&input.items);
        let total = document_total(&lines)?;
        let issue_date = input.issue_date.unwrap_or_else(|| Utc::now().date_naive());

        let txn = begin_scoped(&self.db, company_id).await?;
        let now = timestamp(Utc::now());
        let id = Uuid::new_v4();

        let invoice = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::ProformaInvoice),
            self.options.workflow.numbering_retry_budget,
            |number| proforma_invoices::ActiveModel {
                id: Set(id),
                company_id: Set(company_id.into_inner()),
                invoice_number: Set(number),
                invoice_type: Set(InvoiceType::Proforma.as_str().to_string()),
                status: Set(ProformaStatus::Draft.as_str().to_string()),
                version: Set(1),
                quote_id: Set(None),
                export_order_id: Set(None),
                buyer_name: Set(buyer_name.clone()),
                buyer_address: Set(non_blank(input.buyer_address.clone())),
                currency: Set(input.currency.code().to_string()),
                issue_date: Set(issue_date),
                total_amount: Set(total),
                notes: Set(non_blank(input.notes.clone())),
                submitted_by: Set(None),
                submitted_at: Set(None),
                approved_by: Set(None),
                approved_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                converted_to_commercial_at: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(now),
                updated_at: Set(now),
            },
        )
        .await?;
        let items = insert_proforma_items(&txn, id, &lines).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            invoice_id = %id,
            number = %invoice.invoice_number,
            total = %total,
            "Proforma invoice created"
        );
        Ok(ProformaDetail { invoice, items })
    }

    /// Gets a proforma invoice with its lines.
    ///
    /// # Errors
    ///
    /// `NotFound` if the invoice does not exist in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        id: Uuid,
    ) -> Result<ProformaDetail, WorkflowError> {
        let invoice = find_proforma(&self.db, company_id, id, false).await?;
        let items = load_proforma_items(&self.db, id).await?;
        Ok(ProformaDetail { invoice, items })
    }

    /// Lists proforma invoices, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not a proforma status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &DocumentFilter,
        page: &PageRequest,
    ) -> Result<ListPage<proforma_invoices::Model>, WorkflowError> {
        let mut query = proforma_invoices::Entity::find()
            .filter(proforma_invoices::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(status) = filter.parsed_status::<ProformaStatus>()? {
            query = query.filter(proforma_invoices::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_desc(proforma_invoices::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Submits a draft or revised invoice for approval.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the invoice is draft or revised.
    pub async fn submit(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<proforma_invoices::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Submit, actor.into_inner()),
        )
        .await
    }

    /// Approves a pending invoice.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the invoice is pending. The stored status is
    /// left untouched on failure.
    pub async fn approve(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<proforma_invoices::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Approve, actor.into_inner()),
        )
        .await
    }

    /// Rejects a pending invoice.
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
    ) -> Result<proforma_invoices::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Reject, actor.into_inner()).with_reason(reason),
        )
        .await
    }

    /// Opens a new revision of a rejected invoice.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the invoice is rejected.
    pub async fn revise(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<proforma_invoices::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Revise, actor.into_inner()),
        )
        .await
    }

    async fn transition(
        &self,
        company_id: CompanyId,
        id: Uuid,
        request: TransitionRequest<ProformaStatus>,
    ) -> Result<proforma_invoices::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let invoice = find_proforma(&txn, company_id, id, true).await?;
        let current: ProformaStatus = stored_status(&invoice.status)?;
        let transition = WorkflowService::apply(current, request, Utc::now())?;

        let number = invoice.invoice_number.clone();
        let version = invoice.version;
        let mut active: proforma_invoices::ActiveModel = invoice.into();
        stamp(&mut active, version, &transition);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            invoice_id = %id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "Proforma invoice transitioned"
        );
        self.options
            .publish(&status_event(company_id, id, &number, &transition));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn detail(invoice_type: &str) -> ProformaDetail {
        let now = Utc::now().into();
        ProformaDetail {
            invoice: proforma_invoices::Model {
                id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                invoice_number: "PI-2025-004".to_string(),
                invoice_type: invoice_type.to_string(),
                status: "approved".to_string(),
                version: 2,
                quote_id: None,
                export_order_id: None,
                buyer_name: "Nordic Imports AB".to_string(),
                buyer_address: None,
                currency: "EUR".to_string(),
                issue_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
                total_amount: dec!(900.00),
                notes: None,
                submitted_by: None,
                submitted_at: None,
                approved_by: None,
                approved_at: None,
                rejected_by: None,
                rejected_at: None,
                rejection_reason: None,
                converted_to_commercial_at: None,
                created_by: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            },
            items: vec![],
        }
    }

    #[test]
    fn test_snapshot_carries_invoice_fields() {
        let snapshot = detail("proforma").snapshot().unwrap();
        assert_eq!(snapshot.number, "PI-2025-004");
        assert_eq!(snapshot.invoice_type, Some(InvoiceType::Proforma));
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.total, dec!(900.00));
    }

    #[test]
    fn test_snapshot_rejects_unknown_invoice_type() {
        assert!(matches!(
            detail("credit_note").snapshot(),
            Err(WorkflowError::Database(_))
        ));
    }

    #[test]
    fn test_discount_is_folded_into_unit_price() {
        let line = LineItem {
            sku_id: None,
            description: "Cotton yarn".to_string(),
            hsn_code: None,
            quantity: dec!(10),
            unit: "kg".to_string(),
            unit_price: dec!(100),
            discount_percent: dec!(10),
            tax_percent: dec!(18),
            net_weight: None,
            gross_weight: None,
        };
        let folded = proforma_lines(std::slice::from_ref(&line));
        assert_eq!(folded[0].unit_price, dec!(90));
        assert_eq!(folded[0].discount_percent, Decimal::ZERO);
        assert_eq!(folded[0].line_total().unwrap(), line.line_total().unwrap());
    }
}
