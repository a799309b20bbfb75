//! Document workflow management for Eximflow.
//!
//! This module implements the status lifecycles of every document type and
//! the single engine that interprets their transition tables.
//!
//! # Modules
//!
//! - `types` - Status enums, document types and workflow actions
//! - `error` - Workflow error type shared by every core module
//! - `rules` - Transition tables per document type
//! - `service` - The transition interpreter

pub mod error;
pub mod rules;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use rules::{Lifecycle, TransitionRule};
pub use service::{Transition, TransitionRequest, WorkflowService};
pub use types::{
    DocumentType, EnquiryPriority, EnquiryStatus, ExportOrderStatus, InvoiceType, PaymentStatus,
    ProformaStatus, PurchaseOrderStatus, QuoteStatus, RealizationStatus, ShipmentStatus,
    ShippingBillStatus, WorkflowAction,
};
