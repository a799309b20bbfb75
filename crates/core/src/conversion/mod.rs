//! Conversion preconditions along the document chain.
//!
//! enquiry → quote → proforma invoice → export order → shipping bill, plus the
//! in-place proforma → commercial switch. Each check runs against the locked
//! source row; the caller allocates the target number and writes everything
//! in one transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::{Transition, TransitionRequest, WorkflowService};
use crate::workflow::types::{
    DocumentType, EnquiryStatus, ExportOrderStatus, InvoiceType, ProformaStatus, QuoteStatus,
    ShippingBillStatus, WorkflowAction,
};

/// Export order statuses from which a shipping bill may be raised.
pub const BILLABLE_ORDER_STATUSES: &[ExportOrderStatus] = &[
    ExportOrderStatus::Approved,
    ExportOrderStatus::Confirmed,
    ExportOrderStatus::InProduction,
    ExportOrderStatus::Ready,
    ExportOrderStatus::Shipped,
];

/// Stateless conversion rules.
pub struct ConversionService;

impl ConversionService {
    /// Checks an enquiry can become a quote and returns its own transition.
    ///
    /// # Errors
    ///
    /// `AlreadyConverted` if converted, `InvalidState` if the enquiry is closed.
    pub fn enquiry_to_quote(
        status: EnquiryStatus,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Transition<EnquiryStatus>, WorkflowError> {
        if status == EnquiryStatus::Converted {
            return Err(WorkflowError::AlreadyConverted(
                "Enquiry has already been converted to a quote".to_string(),
            ));
        }
        WorkflowService::apply(status, TransitionRequest::new(WorkflowAction::Convert, actor), now)
    }

    /// Checks a quote can become a proforma invoice and returns its own transition.
    ///
    /// # Errors
    ///
    /// `AlreadyConverted` if converted or already linked to an invoice,
    /// `InvalidState` unless approved or sent.
    pub fn quote_to_proforma(
        status: QuoteStatus,
        linked_proforma: Option<Uuid>,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Transition<QuoteStatus>, WorkflowError> {
        if status == QuoteStatus::Converted || linked_proforma.is_some() {
            return Err(WorkflowError::AlreadyConverted(
                "Quote has already been converted to a proforma invoice".to_string(),
            ));
        }
        WorkflowService::apply(status, TransitionRequest::new(WorkflowAction::Convert, actor), now)
    }

    /// Checks a proforma invoice can become a commercial invoice.
    ///
    /// # Errors
    ///
    /// `AlreadyConverted` if already commercial, `InvalidState` unless approved.
    pub fn proforma_to_commercial(
        status: ProformaStatus,
        invoice_type: InvoiceType,
    ) -> Result<(), WorkflowError> {
        if invoice_type == InvoiceType::Commercial {
            return Err(WorkflowError::AlreadyConverted(
                "Proforma invoice has already been converted to a commercial invoice".to_string(),
            ));
        }
        if status != ProformaStatus::Approved {
            return Err(WorkflowError::InvalidState {
                document: DocumentType::ProformaInvoice,
                action: WorkflowAction::Convert,
                current: status.to_string(),
                attempted: InvoiceType::Commercial.to_string(),
            });
        }
        Ok(())
    }

    /// Checks a proforma invoice can become an export order.
    ///
    /// The invoice keeps its status so it can still become commercial.
    ///
    /// # Errors
    ///
    /// `AlreadyConverted` if an order is already linked, `InvalidState` unless approved.
    pub fn proforma_to_order(
        status: ProformaStatus,
        linked_order: Option<Uuid>,
    ) -> Result<(), WorkflowError> {
        if linked_order.is_some() {
            return Err(WorkflowError::AlreadyConverted(
                "Proforma invoice has already been converted to an export order".to_string(),
            ));
        }
        if status != ProformaStatus::Approved {
            return Err(WorkflowError::InvalidState {
                document: DocumentType::ProformaInvoice,
                action: WorkflowAction::Convert,
                current: status.to_string(),
                attempted: DocumentType::ExportOrder.label().to_string(),
            });
        }
        Ok(())
    }

    /// Checks an export order can have a shipping bill raised against it.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the order is approved and not yet completed.
    pub fn order_to_shipping_bill(status: ExportOrderStatus) -> Result<(), WorkflowError> {
        if BILLABLE_ORDER_STATUSES.contains(&status) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState {
                document: DocumentType::ExportOrder,
                action: WorkflowAction::Convert,
                current: status.to_string(),
                attempted: ShippingBillStatus::Drafted.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commercial_requires_approved() {
        assert!(
            ConversionService::proforma_to_commercial(ProformaStatus::Approved, InvoiceType::Proforma)
                .is_ok()
        );
        for status in ProformaStatus::ALL
            .iter()
            .copied()
            .filter(|s| *s != ProformaStatus::Approved)
        {
            let err = ConversionService::proforma_to_commercial(status, InvoiceType::Proforma)
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_STATE", "{status}");
        }
    }

    #[test]
    fn test_second_commercial_conversion_is_already_converted() {
        let err =
            ConversionService::proforma_to_commercial(ProformaStatus::Approved, InvoiceType::Commercial)
                .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyConverted(_)));
    }

    #[test]
    fn test_already_converted_wins_over_state() {
        let err =
            ConversionService::proforma_to_commercial(ProformaStatus::Draft, InvoiceType::Commercial)
                .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_CONVERTED");
    }

    #[test]
    fn test_enquiry_to_quote() {
        let t = ConversionService::enquiry_to_quote(EnquiryStatus::Contacted, Uuid::new_v4(), Utc::now())
            .unwrap();
        assert_eq!(t.to, EnquiryStatus::Converted);

        let err =
            ConversionService::enquiry_to_quote(EnquiryStatus::Converted, Uuid::new_v4(), Utc::now())
                .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_CONVERTED");

        let err = ConversionService::enquiry_to_quote(EnquiryStatus::Lost, Uuid::new_v4(), Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_quote_to_proforma() {
        let actor = Uuid::new_v4();
        assert!(ConversionService::quote_to_proforma(QuoteStatus::Sent, None, actor, Utc::now()).is_ok());
        assert!(
            ConversionService::quote_to_proforma(QuoteStatus::Approved, None, actor, Utc::now())
                .is_ok()
        );

        let err = ConversionService::quote_to_proforma(
            QuoteStatus::Approved,
            Some(Uuid::new_v4()),
            actor,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_CONVERTED");

        let err = ConversionService::quote_to_proforma(QuoteStatus::Draft, None, actor, Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[test]
    fn test_proforma_to_order() {
        assert!(ConversionService::proforma_to_order(ProformaStatus::Approved, None).is_ok());
        assert_eq!(
            ConversionService::proforma_to_order(ProformaStatus::Approved, Some(Uuid::new_v4()))
                .unwrap_err()
                .error_code(),
            "ALREADY_CONVERTED"
        );
        assert_eq!(
            ConversionService::proforma_to_order(ProformaStatus::Pending, None)
                .unwrap_err()
                .error_code(),
            "INVALID_STATE"
        );
    }

    #[test]
    fn test_order_to_shipping_bill() {
        for status in ExportOrderStatus::ALL {
            let result = ConversionService::order_to_shipping_bill(*status);
            assert_eq!(result.is_ok(), BILLABLE_ORDER_STATUSES.contains(status), "{status}");
        }
    }
}
