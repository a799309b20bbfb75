//! Transition tables for every document lifecycle.
//!
//! Each rule names the action, the statuses it may start from and the status
//! it produces. `update_status` rules are keyed by their target status.

use std::fmt;

use crate::workflow::types::{
    DocumentType, EnquiryStatus, ExportOrderStatus, ProformaStatus, PurchaseOrderStatus,
    QuoteStatus, ShippingBillStatus, WorkflowAction,
};

/// One row of a transition table.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRule<S: 'static> {
    /// The action this rule answers.
    pub action: WorkflowAction,
    /// Statuses the document must be in.
    pub from: &'static [S],
    /// Status after the transition.
    pub to: S,
}

impl<S: PartialEq> TransitionRule<S> {
    /// Returns true if the rule accepts `current` as its source status.
    pub fn allows(&self, current: &S) -> bool {
        self.from.contains(current)
    }
}

const fn rule<S>(action: WorkflowAction, from: &'static [S], to: S) -> TransitionRule<S> {
    TransitionRule { action, from, to }
}

/// A status set with a transition table.
pub trait Lifecycle:
    Copy + Eq + fmt::Display + fmt::Debug + Send + Sync + 'static
{
    /// The document type this lifecycle belongs to.
    const DOCUMENT: DocumentType;

    /// The transition table.
    fn rules() -> &'static [TransitionRule<Self>];

    /// Parses a status of this document type.
    fn parse_status(s: &str) -> Option<Self>;
}

use EnquiryStatus as En;

const ENQUIRY_OPEN: &[En] = &[En::New, En::Contacted, En::Quoted];

static ENQUIRY_RULES: &[TransitionRule<En>] = &[
    rule(WorkflowAction::Convert, ENQUIRY_OPEN, En::Converted),
    rule(WorkflowAction::UpdateStatus, ENQUIRY_OPEN, En::New),
    rule(WorkflowAction::UpdateStatus, ENQUIRY_OPEN, En::Contacted),
    rule(WorkflowAction::UpdateStatus, ENQUIRY_OPEN, En::Quoted),
    rule(WorkflowAction::UpdateStatus, ENQUIRY_OPEN, En::Won),
    rule(WorkflowAction::UpdateStatus, ENQUIRY_OPEN, En::Lost),
    rule(WorkflowAction::UpdateStatus, ENQUIRY_OPEN, En::Converted),
];

impl Lifecycle for EnquiryStatus {
    const DOCUMENT: DocumentType = DocumentType::Enquiry;

    fn rules() -> &'static [TransitionRule<Self>] {
        ENQUIRY_RULES
    }

    fn parse_status(s: &str) -> Option<Self> {
        Self::parse(s)
    }
}

use QuoteStatus as Qt;

static QUOTE_RULES: &[TransitionRule<Qt>] = &[
    rule(WorkflowAction::Submit, &[Qt::Draft, Qt::Revised], Qt::PendingApproval),
    rule(WorkflowAction::Approve, &[Qt::PendingApproval], Qt::Approved),
    rule(WorkflowAction::Reject, &[Qt::PendingApproval], Qt::Rejected),
    rule(WorkflowAction::Send, &[Qt::Draft, Qt::Approved], Qt::Sent),
    rule(WorkflowAction::Revise, &[Qt::Rejected, Qt::Sent], Qt::Revised),
    rule(WorkflowAction::Convert, &[Qt::Approved, Qt::Sent], Qt::Converted),
    rule(
        WorkflowAction::Expire,
        &[Qt::Draft, Qt::Sent, Qt::PendingApproval],
        Qt::Expired,
    ),
];

impl Lifecycle for QuoteStatus {
    const DOCUMENT: DocumentType = DocumentType::Quote;

    fn rules() -> &'static [TransitionRule<Self>] {
        QUOTE_RULES
    }

    fn parse_status(s: &str) -> Option<Self> {
        Self::parse(s)
    }
}

use ProformaStatus as Pi;

static PROFORMA_RULES: &[TransitionRule<Pi>] = &[
    rule(WorkflowAction::Submit, &[Pi::Draft, Pi::Revised], Pi::Pending),
    rule(WorkflowAction::Approve, &[Pi::Pending], Pi::Approved),
    rule(WorkflowAction::Reject, &[Pi::Pending], Pi::Rejected),
    rule(WorkflowAction::Revise, &[Pi::Rejected], Pi::Revised),
];

impl Lifecycle for ProformaStatus {
    const DOCUMENT: DocumentType = DocumentType::ProformaInvoice;

    fn rules() -> &'static [TransitionRule<Self>] {
        PROFORMA_RULES
    }

    fn parse_status(s: &str) -> Option<Self> {
        Self::parse(s)
    }
}

use ExportOrderStatus as Eo;

static EXPORT_ORDER_RULES: &[TransitionRule<Eo>] = &[
    rule(WorkflowAction::Approve, &[Eo::Pending], Eo::Approved),
    rule(WorkflowAction::Reject, &[Eo::Pending], Eo::Rejected),
    rule(WorkflowAction::UpdateStatus, &[Eo::Approved], Eo::Confirmed),
    rule(WorkflowAction::UpdateStatus, &[Eo::Confirmed], Eo::InProduction),
    rule(WorkflowAction::UpdateStatus, &[Eo::InProduction], Eo::Ready),
    rule(WorkflowAction::UpdateStatus, &[Eo::Ready], Eo::Shipped),
    rule(WorkflowAction::UpdateStatus, &[Eo::Shipped], Eo::Completed),
    rule(
        WorkflowAction::UpdateStatus,
        &[Eo::Pending, Eo::Approved, Eo::Confirmed, Eo::InProduction, Eo::Ready],
        Eo::Cancelled,
    ),
];

impl Lifecycle for ExportOrderStatus {
    const DOCUMENT: DocumentType = DocumentType::ExportOrder;

    fn rules() -> &'static [TransitionRule<Self>] {
        EXPORT_ORDER_RULES
    }

    fn parse_status(s: &str) -> Option<Self> {
        Self::parse(s)
    }
}

use PurchaseOrderStatus as Po;

static PURCHASE_ORDER_RULES: &[TransitionRule<Po>] = &[
    rule(WorkflowAction::Submit, &[Po::Draft], Po::Pending),
    rule(WorkflowAction::Approve, &[Po::Pending], Po::Approved),
    rule(WorkflowAction::Reject, &[Po::Pending], Po::Rejected),
    rule(WorkflowAction::UpdateStatus, &[Po::Approved], Po::Ordered),
    rule(WorkflowAction::UpdateStatus, &[Po::Ordered], Po::Received),
    rule(
        WorkflowAction::UpdateStatus,
        &[Po::Draft, Po::Pending, Po::Approved, Po::Ordered],
        Po::Cancelled,
    ),
];

impl Lifecycle for PurchaseOrderStatus {
    const DOCUMENT: DocumentType = DocumentType::PurchaseOrder;

    fn rules() -> &'static [TransitionRule<Self>] {
        PURCHASE_ORDER_RULES
    }

    fn parse_status(s: &str) -> Option<Self> {
        Self::parse(s)
    }
}

use ShippingBillStatus as Sb;

static SHIPPING_BILL_RULES: &[TransitionRule<Sb>] = &[
    rule(WorkflowAction::Approve, &[Sb::Drafted, Sb::Pending], Sb::Filed),
    rule(WorkflowAction::Reject, &[Sb::Drafted, Sb::Pending], Sb::Rejected),
    rule(
        WorkflowAction::File,
        &[Sb::Drafted, Sb::Pending, Sb::Filed],
        Sb::Filed,
    ),
    rule(WorkflowAction::UpdateStatus, &[Sb::Drafted], Sb::Pending),
    rule(WorkflowAction::UpdateStatus, &[Sb::Filed], Sb::Cleared),
    rule(WorkflowAction::UpdateStatus, &[Sb::Cleared], Sb::Shipped),
    rule(
        WorkflowAction::UpdateStatus,
        &[Sb::Drafted, Sb::Pending, Sb::Filed],
        Sb::Cancelled,
    ),
];

impl Lifecycle for ShippingBillStatus {
    const DOCUMENT: DocumentType = DocumentType::ShippingBill;

    fn rules() -> &'static [TransitionRule<Self>] {
        SHIPPING_BILL_RULES
    }

    fn parse_status(s: &str) -> Option<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for<S: Lifecycle>(action: WorkflowAction) -> &'static TransitionRule<S> {
        S::rules()
            .iter()
            .find(|r| r.action == action)
            .expect("rule present")
    }

    #[test]
    fn test_quote_expiry_sources() {
        let expire = rule_for::<QuoteStatus>(WorkflowAction::Expire);
        assert!(expire.allows(&QuoteStatus::Draft));
        assert!(expire.allows(&QuoteStatus::Sent));
        assert!(expire.allows(&QuoteStatus::PendingApproval));
        assert!(!expire.allows(&QuoteStatus::Approved));
        assert_eq!(expire.to, QuoteStatus::Expired);
    }

    #[test]
    fn test_shipping_bill_approval_targets_filed() {
        let approve = rule_for::<ShippingBillStatus>(WorkflowAction::Approve);
        assert_eq!(approve.to, ShippingBillStatus::Filed);
        assert_eq!(
            approve.from,
            &[ShippingBillStatus::Drafted, ShippingBillStatus::Pending]
        );
    }

    #[test]
    fn test_update_status_targets_are_unique_per_lifecycle() {
        fn check<S: Lifecycle + std::hash::Hash>() {
            let mut seen = std::collections::HashSet::new();
            for r in S::rules()
                .iter()
                .filter(|r| r.action == WorkflowAction::UpdateStatus)
            {
                assert!(seen.insert(r.to), "duplicate update rule for {}", r.to);
            }
        }
        check::<EnquiryStatus>();
        check::<QuoteStatus>();
        check::<ProformaStatus>();
        check::<ExportOrderStatus>();
        check::<PurchaseOrderStatus>();
        check::<ShippingBillStatus>();
    }

    #[test]
    fn test_non_update_actions_have_one_rule() {
        fn check<S: Lifecycle>() {
            let mut actions = S::rules()
                .iter()
                .filter(|r| r.action != WorkflowAction::UpdateStatus)
                .map(|r| r.action)
                .collect::<Vec<_>>();
            let total = actions.len();
            actions.dedup();
            assert_eq!(actions.len(), total, "{}", S::DOCUMENT);
        }
        check::<QuoteStatus>();
        check::<ProformaStatus>();
        check::<ExportOrderStatus>();
        check::<PurchaseOrderStatus>();
        check::<ShippingBillStatus>();
    }
}
