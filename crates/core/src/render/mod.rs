//! Document rendering port.
//!
//! PDF layout is done by an external collaborator; the core only defines
//! the snapshot it is given and the trait it implements.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::pricing::LineItem;
use crate::workflow::types::{DocumentType, InvoiceType};

/// Everything a renderer needs to lay out a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSnapshot {
    /// Document type.
    pub document: DocumentType,
    /// Document number.
    pub number: String,
    /// Proforma or commercial, for invoices.
    pub invoice_type: Option<InvoiceType>,
    /// Status text.
    pub status: String,
    /// Version.
    pub version: i32,
    /// Buyer name.
    pub buyer_name: String,
    /// Currency code.
    pub currency: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Lines.
    pub lines: Vec<LineItem>,
    /// Document total.
    pub total: Decimal,
}

impl DocumentSnapshot {
    /// Title printed on the document.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match (self.document, self.invoice_type) {
            (DocumentType::ProformaInvoice, Some(InvoiceType::Commercial)) => "Commercial Invoice",
            (DocumentType::ProformaInvoice, _) => "Proforma Invoice",
            (DocumentType::Quote, _) => "Quotation",
            (DocumentType::ExportOrder, _) => "Export Order",
            (DocumentType::ShippingBill, _) => "Shipping Bill",
            (DocumentType::PurchaseOrder, _) => "Purchase Order",
            (DocumentType::Enquiry, _) => "Enquiry",
        }
    }

    /// Suggested download file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.number)
    }
}

/// Rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer does not handle this document type.
    #[error("Rendering {0} documents is not supported")]
    Unsupported(DocumentType),

    /// The renderer failed.
    #[error("Rendering failed: {0}")]
    Failed(String),
}

/// Turns a snapshot into a printable file.
pub trait DocumentRenderer: Send + Sync {
    /// MIME type of the output.
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    /// Renders the snapshot.
    fn render(&self, snapshot: &DocumentSnapshot) -> Result<Vec<u8>, RenderError>;
}
