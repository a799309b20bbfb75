//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every write that checks a status locks the row first and runs in one
//! transaction scoped to the caller's company.

pub mod brc;
pub mod company;
pub mod conversion;
pub mod enquiry;
pub mod export_order;
pub mod numbering;
pub mod proforma;
pub mod purchase_order;
pub mod quote;
pub mod shipment;
pub mod shipping_bill;
pub mod stats;
mod support;

pub use brc::{BrcDetail, BrcFilter, BrcRepository, CreateBrcInput};
pub use company::CompanyRepository;
pub use conversion::{ConversionRepository, EnquiryConversionInput, ShippingBillInput};
pub use enquiry::{CreateEnquiryInput, EnquiryDetail, EnquiryRepository};
pub use export_order::{CreateExportOrderInput, ExportOrderDetail, ExportOrderRepository};
pub use numbering::{NumberScope, NumberingRepository};
pub use proforma::{CreateProformaInput, ProformaDetail, ProformaRepository};
pub use purchase_order::{
    CreatePurchaseOrderInput, PurchaseOrderDetail, PurchaseOrderPaymentInput,
    PurchaseOrderRepository,
};
pub use quote::{CreateQuoteInput, QuoteDetail, QuoteRepository};
pub use shipment::{CreateShipmentInput, ShipmentDetail, ShipmentRepository};
pub use shipping_bill::ShippingBillRepository;
pub use stats::StatsRepository;
pub use support::{DocumentFilter, ListPage};
