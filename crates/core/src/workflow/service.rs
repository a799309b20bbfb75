//! Workflow service for document status transitions.
//!
//! A single interpreter walks the transition table of whichever lifecycle it
//! is given. It never mutates anything: it returns the `Transition` the
//! caller must persist, or the reason the action is refused.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::rules::{Lifecycle, TransitionRule};
use crate::workflow::types::WorkflowAction;

/// What the caller wants to do to a document.
#[derive(Debug, Clone)]
pub struct TransitionRequest<S> {
    /// The action.
    pub action: WorkflowAction,
    /// The acting user.
    pub actor: Uuid,
    /// Free-text reason (required for rejections).
    pub reason: Option<String>,
    /// Target status, used by `update_status`.
    pub target: Option<S>,
}

impl<S> TransitionRequest<S> {
    /// A request for `action` by `actor` without reason or target.
    #[must_use]
    pub const fn new(action: WorkflowAction, actor: Uuid) -> Self {
        Self {
            action,
            actor,
            reason: None,
            target: None,
        }
    }

    /// Attaches a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a target status.
    #[must_use]
    pub fn with_target(mut self, target: S) -> Self {
        self.target = Some(target);
        self
    }
}

/// An accepted transition with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition<S> {
    /// Status before.
    pub from: S,
    /// Status after.
    pub to: S,
    /// The action performed.
    pub action: WorkflowAction,
    /// Who performed it.
    pub actor: Uuid,
    /// When it was performed.
    pub at: DateTime<Utc>,
    /// Trimmed reason, if one was given.
    pub reason: Option<String>,
}

impl<S> Transition<S> {
    /// Revisions bump the document version.
    #[must_use]
    pub fn bumps_version(&self) -> bool {
        self.action == WorkflowAction::Revise
    }
}

/// Stateless service for document workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Validates `request` against the lifecycle of `S` and returns the transition.
    ///
    /// The reason check runs before the status check, so a blank rejection
    /// reason fails the same way whatever the document's status.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::Validation` if a required reason is blank, or an
    ///   `update_status` request has no target.
    /// * `WorkflowError::InvalidState` if no rule accepts the current status.
    pub fn apply<S: Lifecycle>(
        current: S,
        request: TransitionRequest<S>,
        now: DateTime<Utc>,
    ) -> Result<Transition<S>, WorkflowError> {
        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ToString::to_string);

        if request.action.requires_reason() && reason.is_none() {
            return Err(WorkflowError::validation("Rejection reason is required"));
        }

        let rule = Self::find_rule::<S>(request.action, request.target)?;
        let Some(rule) = rule else {
            return Err(WorkflowError::InvalidState {
                document: S::DOCUMENT,
                action: request.action,
                current: current.to_string(),
                attempted: request
                    .target
                    .map_or_else(|| request.action.to_string(), |t| t.to_string()),
            });
        };

        if !rule.allows(&current) {
            return Err(WorkflowError::InvalidState {
                document: S::DOCUMENT,
                action: request.action,
                current: current.to_string(),
                attempted: rule.to.to_string(),
            });
        }

        Ok(Transition {
            from: current,
            to: rule.to,
            action: request.action,
            actor: request.actor,
            at: now,
            reason,
        })
    }

    fn find_rule<S: Lifecycle>(
        action: WorkflowAction,
        target: Option<S>,
    ) -> Result<Option<&'static TransitionRule<S>>, WorkflowError> {
        if action == WorkflowAction::UpdateStatus {
            let target = target.ok_or_else(|| WorkflowError::validation("Target status is required"))?;
            return Ok(S::rules()
                .iter()
                .find(|r| r.action == action && r.to == target));
        }
        Ok(S::rules().iter().find(|r| r.action == action))
    }

    /// Submit a document for approval.
    pub fn submit<S: Lifecycle>(
        current: S,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Transition<S>, WorkflowError> {
        Self::apply(current, TransitionRequest::new(WorkflowAction::Submit, actor), now)
    }

    /// Approve a document.
    pub fn approve<S: Lifecycle>(
        current: S,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Transition<S>, WorkflowError> {
        Self::apply(current, TransitionRequest::new(WorkflowAction::Approve, actor), now)
    }

    /// Reject a document. The reason must not be blank.
    pub fn reject<S: Lifecycle>(
        current: S,
        actor: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition<S>, WorkflowError> {
        Self::apply(
            current,
            TransitionRequest::new(WorkflowAction::Reject, actor).with_reason(reason),
            now,
        )
    }

    /// Parses `new_status` against the lifecycle and applies the matching update rule.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::Validation` if `new_status` is not a status of `S`.
    /// * `WorkflowError::InvalidState` if no update rule leads there from `current`.
    pub fn update_status<S: Lifecycle>(
        current: S,
        new_status: &str,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Transition<S>, WorkflowError> {
        let target = S::parse_status(new_status).ok_or_else(|| {
            WorkflowError::validation(format!(
                "Invalid status '{new_status}' for {}",
                S::DOCUMENT
            ))
        })?;
        Self::apply(
            current,
            TransitionRequest::new(WorkflowAction::UpdateStatus, actor).with_target(target),
            now,
        )
    }

    /// Returns true if `action` is accepted from `current`.
    #[must_use]
    pub fn can_apply<S: Lifecycle>(current: S, action: WorkflowAction) -> bool {
        S::rules()
            .iter()
            .any(|r| r.action == action && r.allows(&current))
    }

    /// Actions accepted from `current`, in table order, without duplicates.
    #[must_use]
    pub fn available_actions<S: Lifecycle>(current: S) -> Vec<WorkflowAction> {
        let mut actions = Vec::new();
        for r in S::rules() {
            if r.allows(&current) && !actions.contains(&r.action) {
                actions.push(r.action);
            }
        }
        actions
    }

    /// Statuses reachable through `update_status` from `current`.
    #[must_use]
    pub fn update_targets<S: Lifecycle>(current: S) -> Vec<S> {
        S::rules()
            .iter()
            .filter(|r| r.action == WorkflowAction::UpdateStatus && r.allows(&current))
            .map(|r| r.to)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{
        EnquiryStatus, ExportOrderStatus, ProformaStatus, QuoteStatus, ShippingBillStatus,
    };

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_approve_pending_proforma() {
        let actor = Uuid::new_v4();
        let at = now();
        let t = WorkflowService::approve(ProformaStatus::Pending, actor, at).unwrap();
        assert_eq!(t.from, ProformaStatus::Pending);
        assert_eq!(t.to, ProformaStatus::Approved);
        assert_eq!(t.actor, actor);
        assert_eq!(t.at, at);
        assert!(!t.bumps_version());
    }

    #[test]
    fn test_approve_rejected_proforma_fails_with_message() {
        let err = WorkflowService::approve(ProformaStatus::Rejected, Uuid::new_v4(), now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot approve proforma invoice with status: rejected (attempted: approved)"
        );
    }

    #[test]
    fn test_reject_requires_reason_before_state_check() {
        // approved is not a valid source for reject, but the reason is checked first
        let err = WorkflowService::reject(ProformaStatus::Approved, Uuid::new_v4(), "   ", now())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn test_reject_trims_reason() {
        let t = WorkflowService::reject(
            ExportOrderStatus::Pending,
            Uuid::new_v4(),
            "  price too high ",
            now(),
        )
        .unwrap();
        assert_eq!(t.to, ExportOrderStatus::Rejected);
        assert_eq!(t.reason.as_deref(), Some("price too high"));
    }

    #[test]
    fn test_shipping_bill_approve_files_it() {
        let t = WorkflowService::approve(ShippingBillStatus::Drafted, Uuid::new_v4(), now())
            .unwrap();
        assert_eq!(t.to, ShippingBillStatus::Filed);
    }

    #[test]
    fn test_revise_bumps_version() {
        let t = WorkflowService::apply(
            QuoteStatus::Rejected,
            TransitionRequest::new(WorkflowAction::Revise, Uuid::new_v4()),
            now(),
        )
        .unwrap();
        assert_eq!(t.to, QuoteStatus::Revised);
        assert!(t.bumps_version());
    }

    #[test]
    fn test_action_without_rule_is_invalid_state() {
        let err = WorkflowService::apply(
            ProformaStatus::Draft,
            TransitionRequest::new(WorkflowAction::Send, Uuid::new_v4()),
            now(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_update_status_unknown_value_is_validation_error() {
        let err = WorkflowService::update_status(
            EnquiryStatus::New,
            "archived",
            Uuid::new_v4(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn test_update_status_follows_order_pipeline() {
        let actor = Uuid::new_v4();
        let t = WorkflowService::update_status(ExportOrderStatus::Approved, "confirmed", actor, now())
            .unwrap();
        assert_eq!(t.to, ExportOrderStatus::Confirmed);

        let err = WorkflowService::update_status(ExportOrderStatus::Pending, "shipped", actor, now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot update status of export order with status: pending (attempted: shipped)"
        );
    }

    #[test]
    fn test_closed_enquiry_cannot_be_updated() {
        let err =
            WorkflowService::update_status(EnquiryStatus::Lost, "new", Uuid::new_v4(), now())
                .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_update_without_target_is_validation_error() {
        let err = WorkflowService::apply::<ExportOrderStatus>(
            ExportOrderStatus::Approved,
            TransitionRequest::new(WorkflowAction::UpdateStatus, Uuid::new_v4()),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn test_available_actions() {
        assert_eq!(
            WorkflowService::available_actions(QuoteStatus::Draft),
            vec![
                WorkflowAction::Submit,
                WorkflowAction::Send,
                WorkflowAction::Expire
            ]
        );
        assert!(WorkflowService::available_actions(ProformaStatus::Approved).is_empty());
        assert_eq!(
            WorkflowService::update_targets(ShippingBillStatus::Filed),
            vec![ShippingBillStatus::Cleared, ShippingBillStatus::Cancelled]
        );
        assert!(WorkflowService::can_apply(
            ShippingBillStatus::Filed,
            WorkflowAction::File
        ));
    }
}
