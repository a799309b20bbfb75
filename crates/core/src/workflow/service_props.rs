//! Property-based tests for WorkflowService.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::rules::Lifecycle;
use crate::workflow::service::{TransitionRequest, WorkflowService};
use crate::workflow::types::{
    ExportOrderStatus, ProformaStatus, PurchaseOrderStatus, QuoteStatus, ShippingBillStatus,
    WorkflowAction,
};

fn arb_proforma_status() -> impl Strategy<Value = ProformaStatus> {
    proptest::sample::select(ProformaStatus::ALL)
}

fn arb_quote_status() -> impl Strategy<Value = QuoteStatus> {
    proptest::sample::select(QuoteStatus::ALL)
}

fn arb_order_status() -> impl Strategy<Value = ExportOrderStatus> {
    proptest::sample::select(ExportOrderStatus::ALL)
}

fn arb_bill_status() -> impl Strategy<Value = ShippingBillStatus> {
    proptest::sample::select(ShippingBillStatus::ALL)
}

fn arb_po_status() -> impl Strategy<Value = PurchaseOrderStatus> {
    proptest::sample::select(PurchaseOrderStatus::ALL)
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,8}"
}

fn arb_action() -> impl Strategy<Value = WorkflowAction> {
    prop_oneof![
        Just(WorkflowAction::Submit),
        Just(WorkflowAction::Approve),
        Just(WorkflowAction::Reject),
        Just(WorkflowAction::Send),
        Just(WorkflowAction::Revise),
        Just(WorkflowAction::File),
        Just(WorkflowAction::Expire),
        Just(WorkflowAction::Convert),
    ]
}

/// Approve succeeds exactly when the current status is a source of the approve rule.
fn approve_matches_table<S: Lifecycle>(status: S, actor: Uuid) -> Result<(), TestCaseError> {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let rule = S::rules()
        .iter()
        .find(|r| r.action == WorkflowAction::Approve)
        .expect("approve rule");
    match WorkflowService::approve(status, actor, at) {
        Ok(t) => {
            prop_assert!(rule.allows(&status));
            prop_assert_eq!(t.to, rule.to);
            prop_assert_eq!(t.actor, actor);
            prop_assert_eq!(t.at, at);
        }
        Err(err) => {
            prop_assert!(!rule.allows(&status));
            let is_invalid_state = matches!(err, WorkflowError::InvalidState { .. });
            prop_assert!(is_invalid_state);
            prop_assert!(err.to_string().contains(&status.to_string()));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_approve_proforma_iff_pending(status in arb_proforma_status(), actor in arb_uuid()) {
        approve_matches_table(status, actor)?;
        prop_assert_eq!(
            WorkflowService::approve(status, actor, Utc::now()).is_ok(),
            status == ProformaStatus::Pending
        );
    }

    #[test]
    fn prop_approve_order_matches_table(status in arb_order_status(), actor in arb_uuid()) {
        approve_matches_table(status, actor)?;
    }

    #[test]
    fn prop_approve_bill_matches_table(status in arb_bill_status(), actor in arb_uuid()) {
        approve_matches_table(status, actor)?;
    }

    #[test]
    fn prop_approve_po_matches_table(status in arb_po_status(), actor in arb_uuid()) {
        approve_matches_table(status, actor)?;
    }

    #[test]
    fn prop_blank_reason_reject_is_always_validation_error(
        status in arb_proforma_status(),
        reason in arb_blank(),
        actor in arb_uuid(),
    ) {
        let result = WorkflowService::reject(status, actor, &reason, Utc::now());
        let is_validation = matches!(result, Err(WorkflowError::Validation(_)));
        prop_assert!(is_validation);
    }

    #[test]
    fn prop_accepted_transitions_follow_a_rule(
        status in arb_quote_status(),
        action in arb_action(),
        actor in arb_uuid(),
    ) {
        let request = TransitionRequest::new(action, actor).with_reason("needs changes");
        match WorkflowService::apply(status, request, Utc::now()) {
            Ok(t) => {
                prop_assert_eq!(t.from, status);
                let listed = QuoteStatus::rules()
                    .iter()
                    .any(|r| r.action == action && r.allows(&status) && r.to == t.to);
                prop_assert!(listed);
            }
            Err(err) => {
                prop_assert_eq!(err.error_code(), "INVALID_STATE");
                prop_assert!(!WorkflowService::can_apply(status, action));
            }
        }
    }

    #[test]
    fn prop_update_status_round_trips_text(
        from in arb_order_status(),
        to in arb_order_status(),
        actor in arb_uuid(),
    ) {
        let result = WorkflowService::update_status(from, to.as_str(), actor, Utc::now());
        let allowed = WorkflowService::update_targets(from).contains(&to);
        prop_assert_eq!(result.is_ok(), allowed);
        if let Ok(t) = result {
            prop_assert_eq!(t.to, to);
        }
    }
}
