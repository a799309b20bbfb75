//! Shipping bill repository.
//!
//! Bills are only ever raised from an export order (see the conversion
//! repository). Approval files the bill with customs.

use chrono::Utc;
use eximflow_core::WorkflowError;
use eximflow_core::workflow::{
    ShippingBillStatus, Transition, TransitionRequest, WorkflowAction, WorkflowService,
};
use eximflow_shared::types::{CompanyId, PageRequest, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::shipping_bills;

use super::support::{
    DocumentFilter, ListPage, RepoOptions, begin_scoped, db_err, repo_options, status_event,
    stored_status, timestamp,
};

pub(crate) async fn find_bill<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<shipping_bills::Model, WorkflowError> {
    let mut query = shipping_bills::Entity::find_by_id(id)
        .filter(shipping_bills::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("shipping bill", id))
}

fn stamp(active: &mut shipping_bills::ActiveModel, t: &Transition<ShippingBillStatus>) {
    let at = timestamp(t.at);
    active.status = Set(t.to.as_str().to_string());
    match t.action {
        // Re-filing an already filed bill refreshes the filing stamp.
        WorkflowAction::Approve | WorkflowAction::File => {
            active.filed_by = Set(Some(t.actor));
            active.filed_at = Set(Some(at));
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

/// Shipping bill repository.
#[derive(Debug, Clone)]
pub struct ShippingBillRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(ShippingBillRepository);

impl ShippingBillRepository {
    /// Creates a new shipping bill repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Gets a shipping bill.
    ///
    /// # Errors
    ///
    /// `NotFound` if the bill does not exist in the company.
    pub async fn get(
        &self,
        company_id: CompanyId,
        id: Uuid,
    ) -> Result<shipping_bills::Model, WorkflowError> {
        find_bill(&self.db, company_id, id, false).await
    }

    /// Lists shipping bills, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not a shipping bill status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &DocumentFilter,
        page: &PageRequest,
    ) -> Result<ListPage<shipping_bills::Model>, WorkflowError> {
        let mut query = shipping_bills::Entity::find()
            .filter(shipping_bills::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(status) = filter.parsed_status::<ShippingBillStatus>()? {
            query = query.filter(shipping_bills::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_desc(shipping_bills::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Approves a drafted or pending bill, which files it.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the bill is drafted or pending.
    pub async fn approve(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<shipping_bills::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Approve, actor.into_inner()),
        )
        .await
    }

    /// Rejects a drafted or pending bill.
    ///
    /// # Errors
    ///
    /// `Validation` if the reason is blank, `InvalidState` unless drafted or pending.
    pub async fn reject(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        reason: &str,
    ) -> Result<shipping_bills::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::Reject, actor.into_inner()).with_reason(reason),
        )
        .await
    }

    /// Files the bill with customs.
    ///
    /// # Errors
    ///
    /// `InvalidState` once the bill is cleared, shipped, rejected or cancelled.
    pub async fn file(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
    ) -> Result<shipping_bills::Model, WorkflowError> {
        self.transition(
            company_id,
            id,
            TransitionRequest::new(WorkflowAction::File, actor.into_inner()),
        )
        .await
    }

    /// Moves a bill to pending, cleared, shipped or cancelled.
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
    ) -> Result<shipping_bills::Model, WorkflowError> {
        let target: ShippingBillStatus = new_status.trim().parse()?;
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
        request: TransitionRequest<ShippingBillStatus>,
    ) -> Result<shipping_bills::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let bill = find_bill(&txn, company_id, id, true).await?;
        let current: ShippingBillStatus = stored_status(&bill.status)?;
        let transition = WorkflowService::apply(current, request, Utc::now())?;

        let number = bill.sb_number.clone();
        let mut active: shipping_bills::ActiveModel = bill.into();
        stamp(&mut active, &transition);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            shipping_bill_id = %id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "Shipping bill transitioned"
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

    fn bill(status: &str) -> shipping_bills::Model {
        let now = Utc::now().into();
        shipping_bills::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            sb_number: "SB-2025-001".to_string(),
            status: status.to_string(),
            export_order_id: Uuid::new_v4(),
            port_code: Some("INNSA1".to_string()),
            currency: "USD".to_string(),
            fob_value: dec!(1000),
            freight: dec!(50),
            insurance: dec!(5),
            filed_by: None,
            filed_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_approve_stamps_filing() {
        let actor = Uuid::new_v4();
        let t = WorkflowService::approve(ShippingBillStatus::Pending, actor, Utc::now()).unwrap();
        let mut active: shipping_bills::ActiveModel = bill("pending").into();
        stamp(&mut active, &t);
        assert_eq!(active.status, Set("filed".to_string()));
        assert_eq!(active.filed_by, Set(Some(actor)));
    }

    #[test]
    fn test_status_update_leaves_filing_alone() {
        let t = WorkflowService::update_status(
            ShippingBillStatus::Filed,
            "cleared",
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap();
        let mut active: shipping_bills::ActiveModel = bill("filed").into();
        stamp(&mut active, &t);
        assert_eq!(active.status, Set("cleared".to_string()));
        assert!(matches!(active.filed_by, sea_orm::ActiveValue::Unchanged(None)));
    }
}
