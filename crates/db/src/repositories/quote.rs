//! Quote repository.
//!
//! Quotes carry a version that starts at 1 and grows with every revision.
//! Expiry is a sweep over quotes whose validity date has passed.

use chrono::{Days, NaiveDate, Utc};
use eximflow_core::pricing::{LineItem, price_lines};
use eximflow_core::workflow::{
    Lifecycle, QuoteStatus, Transition, TransitionRequest, WorkflowAction, WorkflowService,
};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::{CompanyId, Currency, PageRequest, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{quote_items, quotes};
use crate::rls::set_rls_context;

use super::numbering::{NumberScope, insert_numbered};
use super::support::{
    DocumentFilter, ListPage, RepoOptions, begin_scoped, db_err, non_blank, repo_options,
    required, status_event, stored_status, timestamp,
};

/// Input for creating a quote.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteInput {
    /// Buyer name.
    pub buyer_name: String,
    /// Buyer email.
    #[serde(default)]
    pub buyer_email: Option<String>,
    /// Quote currency.
    #[serde(default)]
    pub currency: Currency,
    /// Last day the quote is valid; defaults to the configured validity.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Priced lines.
    pub items: Vec<LineItem>,
}

/// A quote with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteDetail {
    /// The quote row.
    #[serde(flatten)]
    pub quote: quotes::Model,
    /// Lines in position order.
    pub items: Vec<quote_items::Model>,
}

impl QuoteDetail {
    /// Lines as pricing input.
    #[must_use]
    pub fn lines(&self) -> Vec<LineItem> {
        self.items.iter().map(line_from_row).collect()
    }
}

pub(crate) fn line_from_row(item: &quote_items::Model) -> LineItem {
    LineItem {
        sku_id: item.sku_id,
        description: item.description.clone(),
        hsn_code: item.hsn_code.clone(),
        quantity: item.quantity,
        unit: item.unit.clone(),
        unit_price: item.unit_price,
        discount_percent: item.discount_percent,
        tax_percent: item.tax_percent,
        net_weight: None,
        gross_weight: None,
    }
}

/// Default validity end for a quote created on `today`.
pub(crate) fn default_valid_until(today: NaiveDate, validity_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(validity_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Loads a quote owned by `company_id`, optionally locking it.
pub(crate) async fn find_quote<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<quotes::Model, WorkflowError> {
    let mut query =
        quotes::Entity::find_by_id(id).filter(quotes::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("quote", id))
}

pub(crate) async fn load_quote_items<C: ConnectionTrait>(
    conn: &C,
    quote_id: Uuid,
) -> Result<Vec<quote_items::Model>, WorkflowError> {
    quote_items::Entity::find()
        .filter(quote_items::Column::QuoteId.eq(quote_id))
        .order_by_asc(quote_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Inserts priced lines for `quote_id`, in order.
pub(crate) async fn insert_quote_items<C: ConnectionTrait>(
    conn: &C,
    quote_id: Uuid,
    lines: &[LineItem],
) -> Result<Vec<quote_items::Model>, WorkflowError> {
    let mut items = Vec::with_capacity(lines.len());
    for (position, line) in (1..).zip(lines) {
        let item = quote_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            quote_id: Set(quote_id),
            position: Set(position),
            sku_id: Set(line.sku_id),
            description: Set(line.description.trim().to_string()),
            hsn_code: Set(line.hsn_code.clone()),
            quantity: Set(line.quantity),
            unit: Set(line.unit.clone()),
            unit_price: Set(line.unit_price),
            discount_percent: Set(line.discount_percent),
            tax_percent: Set(line.tax_percent),
            line_total: Set(line.line_total()?),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
        items.push(item);
    }
    Ok(items)
}

/// Writes the audit columns a transition touches.
pub(crate) fn stamp_quote(
    active: &mut quotes::ActiveModel,
    current_version: i32,
    t: &Transition<QuoteStatus>,
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
        WorkflowAction::Send => active.sent_at = Set(Some(at)),
        WorkflowAction::Convert => active.converted_at = Set(Some(at)),
        _ => {}
    }
    if t.bumps_version() {
        active.version = Set(current_version + 1);
        active.approved_by = Set(None);
        active.approved_at = Set(None);
        active.rejected_by = Set(None);
        active.rejected_at = Set(None);
        active.rejection_reason = Set(None);
    }
    active.updated_at = Set(at);
}

/// Quote repository.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(QuoteRepository);

impl QuoteRepository {
    /// Creates a new quote repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Creates a draft quote with a fresh `QT` number.
    ///
    /// # Errors
    ///
    /// * `Validation` if the buyer is blank, there are no lines, a line is
    ///   invalid, or the validity date is in the past.
    /// * `NumberingConflict` if no unique number could be allocated.
    pub async fn create(
        &self,
        company_id: CompanyId,
        actor: UserId,
        input: CreateQuoteInput,
    ) -> Result<QuoteDetail, WorkflowError> {
        let buyer_name = required(&input.buyer_name, "Buyer name")?;
        let total = price_lines(&input.items)?;
        let today = Utc::now().date_naive();
        let valid_until = input.valid_until.unwrap_or_else(|| {
            default_valid_until(today, self.options.workflow.quote_validity_days)
        });
        if valid_until < today {
            return Err(WorkflowError::validation("Valid-until date cannot be in the past"));
        }

        let txn = begin_scoped(&self.db, company_id).await?;
        let now = timestamp(Utc::now());
        let id = Uuid::new_v4();

        let quote = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::Quote),
            self.options.workflow.numbering_retry_budget,
            |number| quotes::ActiveModel {
                id: Set(id),
                company_id: Set(company_id.into_inner()),
                quote_number: Set(number),
                status: Set(QuoteStatus::Draft.as_str().to_string()),
                version: Set(1),
                enquiry_id: Set(None),
                proforma_invoice_id: Set(None),
                buyer_name: Set(buyer_name.clone()),
                buyer_email: Set(non_blank(input.buyer_email.clone())),
                currency: Set(input.currency.code().to_string()),
                valid_until: Set(valid_until),
                total_amount: Set(total),
                notes: Set(non_blank(input.notes.clone())),
                submitted_by: Set(None),
                submitted_at: Set(None),
                approved_by: Set(None),
                approved_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                sent_at: Set(None),
                converted_at: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(now),
                updated_at: Set(now),
            },
        )
        .await?;
        let items = insert_quote_items(&txn, id, &input.items).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            quote_id = %id,
            number = %quote.quote_number,
            total = %total,
            "Quote created"
        );
        Ok(QuoteDetail { quote, items })
    }

    /// Gets a quote with its lines.
    ///
    /// # Errors
    ///
    /// `NotFound` if the quote does not exist in the company.
    pub async fn get(&self, company_id: CompanyId, id: Uuid) -> Result<QuoteDetail, WorkflowError> {
        let quote = find_quote(&self.db, company_id, id, false).await?;
        let items = load_quote_items(&self.db, id).await?;
        Ok(QuoteDetail { quote, items })
    }

    /// Lists quotes, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not a quote status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &DocumentFilter,
        page: &PageRequest,
    ) -> Result<ListPage<quotes::Model>, WorkflowError> {
        let mut query =
            quotes::Entity::find().filter(quotes::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(status) = filter.parsed_status::<QuoteStatus>()? {
            query = query.filter(quotes::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_desc(quotes::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Submits a draft or revised quote for approval.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the quote is draft or revised.
    pub async fn submit(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<quotes::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Submit, actor.into_inner()),
        )
        .await
    }

    /// Approves a quote pending approval.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the quote is pending approval.
    pub async fn approve(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<quotes::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Approve, actor.into_inner()),
        )
        .await
    }

    /// Rejects a quote pending approval.
    ///
    /// # Errors
    ///
    /// `Validation` if the reason is blank, `InvalidState` unless pending approval.
    pub async fn reject(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        reason: &str,
    ) -> Result<quotes::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Reject, actor.into_inner()).with_reason(reason),
        )
        .await
    }

    /// Marks a quote as sent to the buyer.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the quote is draft or approved.
    pub async fn send(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<quotes::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Send, actor.into_inner()),
        )
        .await
    }

    /// Opens a new revision of a rejected or sent quote.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the quote is rejected or sent.
    pub async fn revise(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<quotes::Model, WorkflowError> {
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
        request: TransitionRequest<QuoteStatus>,
    ) -> Result<quotes::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let quote = find_quote(&txn, company_id, id, true).await?;
        let current: QuoteStatus = stored_status(&quote.status)?;
        let transition = WorkflowService::apply(current, request, Utc::now())?;

        let number = quote.quote_number.clone();
        let version = quote.version;
        let mut active: quotes::ActiveModel = quote.into();
        stamp_quote(&mut active, version, &transition);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            quote_id = %id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "Quote transitioned"
        );
        self.options
            .publish(&status_event(company_id, id, &number, &transition));
        Ok(updated)
    }

    /// Expires open quotes whose validity ended before `today`.
    ///
    /// Only statuses the expire rule accepts are touched, so running the sweep
    /// twice changes nothing the second time. `None` sweeps every company.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` if the update fails.
    pub async fn expire_stale(
        &self,
        company_id: Option<CompanyId>,
        today: NaiveDate,
    ) -> Result<u64, WorkflowError> {
        let sources: Vec<&'static str> = QuoteStatus::rules()
            .iter()
            .filter(|r| r.action == WorkflowAction::Expire)
            .flat_map(|r| r.from.iter().map(QuoteStatus::as_str))
            .collect();

        let txn = self.db.begin().await.map_err(db_err)?;
        let mut update = quotes::Entity::update_many()
            .col_expr(
                quotes::Column::Status,
                Expr::value(QuoteStatus::Expired.as_str()),
            )
            .filter(quotes::Column::Status.is_in(sources))
            .filter(quotes::Column::ValidUntil.lt(today));
        if let Some(company_id) = company_id {
            set_rls_context(&txn, company_id).await.map_err(db_err)?;
            update = update.filter(quotes::Column::CompanyId.eq(company_id.into_inner()));
        }
        let result = update.exec(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        if result.rows_affected > 0 {
            tracing::info!(expired = result.rows_affected, %today, "Expired stale quotes");
        }
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_validity() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(
            default_valid_until(today, 30),
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
        );
    }

    #[test]
    fn test_line_from_row_keeps_pricing() {
        let row = quote_items::Model {
            id: Uuid::new_v4(),
            quote_id: Uuid::new_v4(),
            position: 1,
            sku_id: None,
            description: "Steel flanges".to_string(),
            hsn_code: Some("7307".to_string()),
            quantity: dec!(10),
            unit: "pcs".to_string(),
            unit_price: dec!(100),
            discount_percent: dec!(10),
            tax_percent: dec!(18),
            line_total: dec!(1062.00),
        };
        let line = line_from_row(&row);
        assert_eq!(line.line_total().unwrap(), dec!(1062.00));
    }

    #[test]
    fn test_create_input_defaults_to_usd() {
        let input: CreateQuoteInput = serde_json::from_str(
            r#"{"buyer_name": "Acme", "items": [{"description": "x", "quantity": "1", "unit_price": "5"}]}"#,
        )
        .unwrap();
        assert_eq!(input.currency, Currency::Usd);
        assert!(input.valid_until.is_none());
    }
}
