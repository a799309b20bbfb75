//! Workflow domain types for document lifecycle management.
//!
//! Every document type has its own closed status set. Statuses are stored as
//! lowercase snake_case text and parsed back into these enums at the edge.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflow::error::WorkflowError;

/// Generates a status enum with text conversions and the full status list.
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Text form of every value, in lifecycle order.
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            /// Returns the string representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Parses a value from a string, ignoring case and surrounding whitespace.
            pub fn parse(s: &str) -> Option<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = WorkflowError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| {
                    WorkflowError::Validation(format!("Invalid {} '{}'", $label, s))
                })
            }
        }
    };
}

status_enum! {
    /// Enquiry pipeline status.
    EnquiryStatus ("enquiry status") {
        /// Freshly captured lead.
        New => "new",
        /// Customer has been contacted.
        Contacted => "contacted",
        /// A quote has been discussed.
        Quoted => "quoted",
        /// Deal won outside the quote flow.
        Won => "won",
        /// Deal lost.
        Lost => "lost",
        /// Turned into a quote.
        Converted => "converted",
    }
}

status_enum! {
    /// Enquiry urgency.
    EnquiryPriority ("enquiry priority") {
        /// Low
        Low => "low",
        /// Medium
        Medium => "medium",
        /// High
        High => "high",
        /// Urgent
        Urgent => "urgent",
    }
}

impl Default for EnquiryPriority {
    fn default() -> Self {
        Self::Medium
    }
}

status_enum! {
    /// Quote status.
    QuoteStatus ("quote status") {
        /// Being prepared.
        Draft => "draft",
        /// Waiting for an internal approver.
        PendingApproval => "pending_approval",
        /// Sent to the buyer.
        Sent => "sent",
        /// Approved internally.
        Approved => "approved",
        /// Rejected internally.
        Rejected => "rejected",
        /// Reworked after rejection or buyer feedback.
        Revised => "revised",
        /// Turned into a proforma invoice.
        Converted => "converted",
        /// Validity window passed.
        Expired => "expired",
    }
}

status_enum! {
    /// Proforma invoice status.
    ProformaStatus ("proforma invoice status") {
        /// Being prepared.
        Draft => "draft",
        /// Submitted for approval.
        Pending => "pending",
        /// Approved; may become a commercial invoice or an export order.
        Approved => "approved",
        /// Rejected by an approver.
        Rejected => "rejected",
        /// Reworked after rejection.
        Revised => "revised",
        /// Superseded by a downstream document.
        Converted => "converted",
    }
}

status_enum! {
    /// Whether an invoice is still a proforma or has become commercial.
    InvoiceType ("invoice type") {
        /// Pre-shipment proforma.
        Proforma => "proforma",
        /// Final commercial invoice.
        Commercial => "commercial",
    }
}

status_enum! {
    /// Export order status.
    ExportOrderStatus ("export order status") {
        /// Awaiting approval.
        Pending => "pending",
        /// Approved.
        Approved => "approved",
        /// Rejected.
        Rejected => "rejected",
        /// Confirmed with the buyer.
        Confirmed => "confirmed",
        /// In production.
        InProduction => "in_production",
        /// Ready to ship.
        Ready => "ready",
        /// Shipped.
        Shipped => "shipped",
        /// Completed.
        Completed => "completed",
        /// Cancelled.
        Cancelled => "cancelled",
    }
}

status_enum! {
    /// Purchase order status.
    PurchaseOrderStatus ("purchase order status") {
        /// Being prepared.
        Draft => "draft",
        /// Awaiting approval.
        Pending => "pending",
        /// Approved.
        Approved => "approved",
        /// Rejected.
        Rejected => "rejected",
        /// Placed with the vendor.
        Ordered => "ordered",
        /// Goods received.
        Received => "received",
        /// Cancelled.
        Cancelled => "cancelled",
    }
}

status_enum! {
    /// Purchase order payment progress.
    PaymentStatus ("payment status") {
        /// Nothing paid.
        Unpaid => "unpaid",
        /// Some but not all paid.
        Partial => "partial",
        /// Paid in full.
        Paid => "paid",
    }
}

status_enum! {
    /// Shipping bill status.
    ShippingBillStatus ("shipping bill status") {
        /// Prepared, not yet lodged.
        Drafted => "drafted",
        /// Awaiting internal approval.
        Pending => "pending",
        /// Lodged with customs.
        Filed => "filed",
        /// Cleared by customs.
        Cleared => "cleared",
        /// Goods have left.
        Shipped => "shipped",
        /// Rejected.
        Rejected => "rejected",
        /// Cancelled.
        Cancelled => "cancelled",
    }
}

status_enum! {
    /// Shipment status.
    ShipmentStatus ("shipment status") {
        /// Planned.
        Planned => "planned",
        /// In transit.
        InTransit => "in_transit",
        /// Delivered.
        Delivered => "delivered",
    }
}

status_enum! {
    /// BRC realization status.
    RealizationStatus ("realization status") {
        /// No payment received.
        Pending => "pending",
        /// Partially realized.
        Partial => "partial",
        /// Fully realized.
        Full => "full",
    }
}

/// Numbered document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Customer enquiry.
    Enquiry,
    /// Sales quote.
    Quote,
    /// Proforma (or commercial) invoice.
    #[serde(rename = "proforma")]
    ProformaInvoice,
    /// Export order.
    #[serde(rename = "order")]
    ExportOrder,
    /// Customs shipping bill.
    ShippingBill,
    /// Inbound purchase order.
    PurchaseOrder,
}

impl DocumentType {
    /// Every numbered document type.
    pub const ALL: &'static [Self] = &[
        Self::Enquiry,
        Self::Quote,
        Self::ProformaInvoice,
        Self::ExportOrder,
        Self::ShippingBill,
        Self::PurchaseOrder,
    ];

    /// Number prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Enquiry => "ENQ",
            Self::Quote => "QT",
            Self::ProformaInvoice => "PI",
            Self::ExportOrder => "EO",
            Self::ShippingBill => "SB",
            Self::PurchaseOrder => "PO",
        }
    }

    /// Stable key used in storage and URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enquiry => "enquiry",
            Self::Quote => "quote",
            Self::ProformaInvoice => "proforma",
            Self::ExportOrder => "order",
            Self::ShippingBill => "shipping_bill",
            Self::PurchaseOrder => "purchase_order",
        }
    }

    /// Human label used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Enquiry => "enquiry",
            Self::Quote => "quote",
            Self::ProformaInvoice => "proforma invoice",
            Self::ExportOrder => "export order",
            Self::ShippingBill => "shipping bill",
            Self::PurchaseOrder => "purchase order",
        }
    }

    /// Parses a storage key or the full snake-case name (case-insensitive,
    /// `-` accepted for `_`).
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "proforma_invoice" => Some(Self::ProformaInvoice),
            "export_order" => Some(Self::ExportOrder),
            _ => Self::ALL.iter().copied().find(|t| t.as_str() == key),
        }
    }

    /// Looks a document type up by its number prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.prefix() == prefix)
    }

    /// Every status of the type, in lifecycle order.
    #[must_use]
    pub const fn statuses(self) -> &'static [&'static str] {
        match self {
            Self::Enquiry => EnquiryStatus::NAMES,
            Self::Quote => QuoteStatus::NAMES,
            Self::ProformaInvoice => ProformaStatus::NAMES,
            Self::ExportOrder => ExportOrderStatus::NAMES,
            Self::ShippingBill => ShippingBillStatus::NAMES,
            Self::PurchaseOrder => PurchaseOrderStatus::NAMES,
        }
    }

    /// Statuses counted as a successful conversion in reports.
    #[must_use]
    pub const fn converted_statuses(self) -> &'static [&'static str] {
        match self {
            Self::Enquiry | Self::Quote | Self::ProformaInvoice => &["converted"],
            Self::ExportOrder => &["shipped", "completed"],
            Self::ShippingBill => &["cleared", "shipped"],
            Self::PurchaseOrder => &["received"],
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Workflow actions that can move a document between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Submit for approval.
    Submit,
    /// Approve.
    Approve,
    /// Reject with a reason.
    Reject,
    /// Send to the counterparty.
    Send,
    /// Rework after rejection.
    Revise,
    /// Lodge with customs.
    File,
    /// Expire after validity lapses.
    Expire,
    /// Mark as converted into a downstream document.
    Convert,
    /// Direct status update against the document's update rules.
    UpdateStatus,
}

impl WorkflowAction {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Send => "send",
            Self::Revise => "revise",
            Self::File => "file",
            Self::Expire => "expire",
            Self::Convert => "convert",
            Self::UpdateStatus => "update_status",
        }
    }

    /// Verb phrase used in error messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::UpdateStatus => "update status of",
            other => other.as_str(),
        }
    }

    /// Actions that refuse to run without a non-blank reason.
    #[must_use]
    pub const fn requires_reason(self) -> bool {
        matches!(self, Self::Reject)
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_as_str() {
        assert_eq!(QuoteStatus::PendingApproval.as_str(), "pending_approval");
        assert_eq!(ExportOrderStatus::InProduction.as_str(), "in_production");
        assert_eq!(ShipmentStatus::InTransit.as_str(), "in_transit");
        assert_eq!(RealizationStatus::Full.as_str(), "full");
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(ProformaStatus::parse("APPROVED"), Some(ProformaStatus::Approved));
        assert_eq!(
            ShippingBillStatus::parse(" Filed "),
            Some(ShippingBillStatus::Filed)
        );
        assert_eq!(EnquiryStatus::parse("archived"), None);
    }

    #[test]
    fn test_from_str_unknown_is_validation_error() {
        let err = QuoteStatus::from_str("bogus").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("quote status"));
    }

    #[test]
    fn test_serde_uses_snake_case_text() {
        let json = serde_json::to_string(&QuoteStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");
        let parsed: ExportOrderStatus = serde_json::from_str("\"in_production\"").unwrap();
        assert_eq!(parsed, ExportOrderStatus::InProduction);
    }

    #[test]
    fn test_names_match_all() {
        assert_eq!(EnquiryStatus::ALL.len(), EnquiryStatus::NAMES.len());
        for (status, name) in QuoteStatus::ALL.iter().zip(QuoteStatus::NAMES) {
            assert_eq!(status.as_str(), *name);
        }
    }

    #[test]
    fn test_document_type_prefixes() {
        assert_eq!(DocumentType::Enquiry.prefix(), "ENQ");
        assert_eq!(DocumentType::Quote.prefix(), "QT");
        assert_eq!(DocumentType::ProformaInvoice.prefix(), "PI");
        assert_eq!(DocumentType::ExportOrder.prefix(), "EO");
        assert_eq!(DocumentType::ShippingBill.prefix(), "SB");
        assert_eq!(DocumentType::PurchaseOrder.prefix(), "PO");
        assert_eq!(DocumentType::from_prefix("SB"), Some(DocumentType::ShippingBill));
        assert_eq!(DocumentType::from_prefix("XX"), None);
    }

    #[test]
    fn test_document_type_parse() {
        assert_eq!(DocumentType::parse("PROFORMA"), Some(DocumentType::ProformaInvoice));
        assert_eq!(DocumentType::parse("shipping-bill"), Some(DocumentType::ShippingBill));
        assert_eq!(DocumentType::parse("export-order"), Some(DocumentType::ExportOrder));
        assert_eq!(DocumentType::parse("brc"), None);
        assert_eq!(DocumentType::ProformaInvoice.to_string(), "proforma invoice");
    }

    #[test]
    fn test_only_reject_requires_reason() {
        assert!(WorkflowAction::Reject.requires_reason());
        assert!(!WorkflowAction::Approve.requires_reason());
        assert_eq!(WorkflowAction::UpdateStatus.verb(), "update status of");
    }
}
