//! `SeaORM` entity definitions.
//!
//! One module per table. Status columns are stored as text and parsed into
//! the workflow enums at the repository boundary.

pub mod brc_payments;
pub mod brcs;
pub mod companies;
pub mod company_users;
pub mod document_sequences;
pub mod enquiries;
pub mod enquiry_items;
pub mod export_order_items;
pub mod export_orders;
pub mod proforma_invoice_items;
pub mod proforma_invoices;
pub mod purchase_order_items;
pub mod purchase_order_payments;
pub mod purchase_orders;
pub mod quote_items;
pub mod quotes;
pub mod shipment_items;
pub mod shipments;
pub mod shipping_bills;

pub mod prelude;
