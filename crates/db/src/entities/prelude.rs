//! Entity re-exports under their table names.

pub use super::brc_payments::Entity as BrcPayments;
pub use super::brcs::Entity as Brcs;
pub use super::companies::Entity as Companies;
pub use super::company_users::Entity as CompanyUsers;
pub use super::document_sequences::Entity as DocumentSequences;
pub use super::enquiries::Entity as Enquiries;
pub use super::enquiry_items::Entity as EnquiryItems;
pub use super::export_order_items::Entity as ExportOrderItems;
pub use super::export_orders::Entity as ExportOrders;
pub use super::proforma_invoice_items::Entity as ProformaInvoiceItems;
pub use super::proforma_invoices::Entity as ProformaInvoices;
pub use super::purchase_order_items::Entity as PurchaseOrderItems;
pub use super::purchase_order_payments::Entity as PurchaseOrderPayments;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::quote_items::Entity as QuoteItems;
pub use super::quotes::Entity as Quotes;
pub use super::shipment_items::Entity as ShipmentItems;
pub use super::shipments::Entity as Shipments;
pub use super::shipping_bills::Entity as ShippingBills;
