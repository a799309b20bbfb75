//! Document conversions.
//!
//! Every conversion is one transaction: the source row is locked, the target
//! number allocated, the target and its lines inserted and the source
//! updated before commit. Any error drops the transaction, which rolls it
//! back, so a failed conversion leaves neither an orphan target nor a
//! half-updated source.

use chrono::{NaiveDate, Utc};
use eximflow_core::conversion::ConversionService;
use eximflow_core::pricing::{EnquiryLine, LineItem, document_total};
use eximflow_core::workflow::{
    EnquiryStatus, ExportOrderStatus, InvoiceType, ProformaStatus, QuoteStatus,
    ShippingBillStatus,
};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::{CompanyId, Currency, UserId};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::{enquiries, export_orders, proforma_invoices, quotes, shipping_bills};

use super::enquiry::{find_enquiry, load_enquiry_items};
use super::export_order::{ExportOrderDetail, find_order, insert_order_items};
use super::numbering::{NumberScope, insert_numbered};
use super::proforma::{
    ProformaDetail, find_proforma, insert_proforma_items, load_proforma_items, proforma_line,
    proforma_lines,
};
use super::quote::{
    QuoteDetail, default_valid_until, find_quote, insert_quote_items, line_from_row,
    load_quote_items, stamp_quote,
};
use super::support::{
    RepoOptions, begin_scoped, converted_event, db_err, non_blank, repo_options, status_event,
    stored_status, timestamp,
};

/// Options for turning an enquiry into a quote.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnquiryConversionInput {
    /// Quote currency.
    #[serde(default)]
    pub currency: Currency,
    /// Last valid day; defaults to the configured validity.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

/// Charges for a shipping bill raised from an export order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingBillInput {
    /// Freight charge.
    #[serde(default)]
    pub freight: Decimal,
    /// Insurance charge.
    #[serde(default)]
    pub insurance: Decimal,
    /// Port of loading.
    #[serde(default)]
    pub port_code: Option<String>,
    /// FOB value; defaults to the order total.
    #[serde(default)]
    pub fob_value: Option<Decimal>,
}

impl ShippingBillInput {
    fn validate(&self) -> Result<(), WorkflowError> {
        if self.freight < Decimal::ZERO {
            return Err(WorkflowError::validation("Freight cannot be negative"));
        }
        if self.insurance < Decimal::ZERO {
            return Err(WorkflowError::validation("Insurance cannot be negative"));
        }
        if self.fob_value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(WorkflowError::validation("FOB value cannot be negative"));
        }
        Ok(())
    }
}

/// Buyer name a quote takes from an enquiry: the customer's company when
/// known, the contact otherwise.
fn buyer_from_enquiry(enquiry: &enquiries::Model) -> String {
    non_blank(enquiry.customer_company.clone()).unwrap_or_else(|| enquiry.customer_name.clone())
}

/// Repository for the conversion chain.
#[derive(Debug, Clone)]
pub struct ConversionRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(ConversionRepository);

impl ConversionRepository {
    /// Creates a new conversion repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Turns an enquiry into a draft quote.
    ///
    /// Expected prices become unit prices with no discount or tax.
    ///
    /// # Errors
    ///
    /// * `AlreadyConverted` if the enquiry was converted before.
    /// * `InvalidState` if the enquiry is won or lost.
    /// * `Validation` if the validity date is in the past.
    pub async fn enquiry_to_quote(
        &self,
        company_id: CompanyId,
        enquiry_id: Uuid,
        actor: UserId,
        input: EnquiryConversionInput,
    ) -> Result<QuoteDetail, WorkflowError> {
        let now = Utc::now();
        let today = now.date_naive();
        let valid_until = input.valid_until.unwrap_or_else(|| {
            default_valid_until(today, self.options.workflow.quote_validity_days)
        });
        if valid_until < today {
            return Err(WorkflowError::validation("Valid-until date cannot be in the past"));
        }

        let txn = begin_scoped(&self.db, company_id).await?;
        let enquiry = find_enquiry(&txn, company_id, enquiry_id, true).await?;
        let status: EnquiryStatus = stored_status(&enquiry.status)?;
        let transition = ConversionService::enquiry_to_quote(status, actor.into_inner(), now)?;

        let lines: Vec<LineItem> = load_enquiry_items(&txn, enquiry_id)
            .await?
            .iter()
            .map(|item| {
                LineItem::from_enquiry(&EnquiryLine {
                    product_id: item.product_id,
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit: item.unit.clone(),
                    expected_price: item.expected_price,
                })
            })
            .collect();
        let total = document_total(&lines)?;

        let quote_id = Uuid::new_v4();
        let at = timestamp(now);
        let buyer_name = buyer_from_enquiry(&enquiry);
        let quote = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::Quote),
            self.options.workflow.numbering_retry_budget,
            |number| quotes::ActiveModel {
                id: Set(quote_id),
                company_id: Set(company_id.into_inner()),
                quote_number: Set(number),
                status: Set(QuoteStatus::Draft.as_str().to_string()),
                version: Set(1),
                enquiry_id: Set(Some(enquiry_id)),
                proforma_invoice_id: Set(None),
                buyer_name: Set(buyer_name.clone()),
                buyer_email: Set(enquiry.customer_email.clone()),
                currency: Set(input.currency.code().to_string()),
                valid_until: Set(valid_until),
                total_amount: Set(total),
                notes: Set(enquiry.notes.clone()),
                submitted_by: Set(None),
                submitted_at: Set(None),
                approved_by: Set(None),
                approved_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                sent_at: Set(None),
                converted_at: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(at),
                updated_at: Set(at),
            },
        )
        .await?;
        let items = insert_quote_items(&txn, quote_id, &lines).await?;

        let enquiry_number = enquiry.enquiry_number.clone();
        let mut active: enquiries::ActiveModel = enquiry.into();
        active.status = Set(transition.to.as_str().to_string());
        active.quote_id = Set(Some(quote_id));
        active.converted_at = Set(Some(at));
        active.updated_at = Set(at);
        active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            enquiry_id = %enquiry_id,
            quote_id = %quote_id,
            number = %quote.quote_number,
            "Enquiry converted to quote"
        );
        self.options.publish(&status_event(
            company_id,
            enquiry_id,
            &enquiry_number,
            &transition,
        ));
        self.options.publish(&converted_event(
            company_id,
            DocumentType::Enquiry,
            enquiry_id,
            Some(DocumentType::Quote),
            quote_id,
            &quote.quote_number,
        ));
        Ok(QuoteDetail { quote, items })
    }

    /// Turns an approved or sent quote into a draft proforma invoice.
    ///
    /// Discounts are folded into unit prices; tax stays on the line.
    ///
    /// # Errors
    ///
    /// * `AlreadyConverted` if the quote is converted or already linked.
    /// * `InvalidState` unless the quote is approved or sent.
    pub async fn quote_to_proforma(
        &self,
        company_id: CompanyId,
        quote_id: Uuid,
        actor: UserId,
    ) -> Result<ProformaDetail, WorkflowError> {
        let now = Utc::now();
        let txn = begin_scoped(&self.db, company_id).await?;
        let quote = find_quote(&txn, company_id, quote_id, true).await?;
        let status: QuoteStatus = stored_status(&quote.status)?;
        let transition = ConversionService::quote_to_proforma(
            status,
            quote.proforma_invoice_id,
            actor.into_inner(),
            now,
        )?;

        let quoted: Vec<LineItem> = load_quote_items(&txn, quote_id)
            .await?
            .iter()
            .map(line_from_row)
            .collect();
        let lines = proforma_lines(&quoted);
        let total = document_total(&lines)?;

        let invoice_id = Uuid::new_v4();
        let at = timestamp(now);
        let invoice = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::ProformaInvoice),
            self.options.workflow.numbering_retry_budget,
            |number| proforma_invoices::ActiveModel {
                id: Set(invoice_id),
                company_id: Set(company_id.into_inner()),
                invoice_number: Set(number),
                invoice_type: Set(InvoiceType::Proforma.as_str().to_string()),
                status: Set(ProformaStatus::Draft.as_str().to_string()),
                version: Set(1),
                quote_id: Set(Some(quote_id)),
                export_order_id: Set(None),
                buyer_name: Set(quote.buyer_name.clone()),
                buyer_address: Set(None),
                currency: Set(quote.currency.clone()),
                issue_date: Set(now.date_naive()),
                total_amount: Set(total),
                notes: Set(quote.notes.clone()),
                submitted_by: Set(None),
                submitted_at: Set(None),
                approved_by: Set(None),
                approved_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                converted_to_commercial_at: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(at),
                updated_at: Set(at),
            },
        )
        .await?;
        let items = insert_proforma_items(&txn, invoice_id, &lines).await?;

        let quote_number = quote.quote_number.clone();
        let version = quote.version;
        let mut active: quotes::ActiveModel = quote.into();
        stamp_quote(&mut active, version, &transition);
        active.proforma_invoice_id = Set(Some(invoice_id));
        active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            quote_id = %quote_id,
            invoice_id = %invoice_id,
            number = %invoice.invoice_number,
            "Quote converted to proforma invoice"
        );
        self.options
            .publish(&status_event(company_id, quote_id, &quote_number, &transition));
        self.options.publish(&converted_event(
            company_id,
            DocumentType::Quote,
            quote_id,
            Some(DocumentType::ProformaInvoice),
            invoice_id,
            &invoice.invoice_number,
        ));
        Ok(ProformaDetail { invoice, items })
    }

    /// Switches an approved proforma invoice to a commercial invoice in place.
    ///
    /// # Errors
    ///
    /// * `AlreadyConverted` if the invoice is already commercial.
    /// * `InvalidState` unless the invoice is approved.
    pub async fn proforma_to_commercial(
        &self,
        company_id: CompanyId,
        invoice_id: Uuid,
        actor: UserId,
    ) -> Result<proforma_invoices::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let invoice = find_proforma(&txn, company_id, invoice_id, true).await?;
        let status: ProformaStatus = stored_status(&invoice.status)?;
        let invoice_type = InvoiceType::parse(&invoice.invoice_type).ok_or_else(|| {
            WorkflowError::Database(format!(
                "Unknown invoice type '{}' in storage",
                invoice.invoice_type
            ))
        })?;
        ConversionService::proforma_to_commercial(status, invoice_type)?;

        let at = timestamp(Utc::now());
        let mut active: proforma_invoices::ActiveModel = invoice.into();
        active.invoice_type = Set(InvoiceType::Commercial.as_str().to_string());
        active.converted_to_commercial_at = Set(Some(at));
        active.updated_at = Set(at);
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            invoice_id = %invoice_id,
            actor = %actor,
            number = %updated.invoice_number,
            "Proforma invoice converted to commercial"
        );
        self.options.publish(&converted_event(
            company_id,
            DocumentType::ProformaInvoice,
            invoice_id,
            None,
            invoice_id,
            &updated.invoice_number,
        ));
        Ok(updated)
    }

    /// Raises a pending export order from an approved proforma invoice.
    ///
    /// The invoice keeps its status and can still become commercial.
    ///
    /// # Errors
    ///
    /// * `AlreadyConverted` if the invoice already has an export order.
    /// * `InvalidState` unless the invoice is approved.
    pub async fn proforma_to_order(
        &self,
        company_id: CompanyId,
        invoice_id: Uuid,
        actor: UserId,
    ) -> Result<ExportOrderDetail, WorkflowError> {
        let now = Utc::now();
        let txn = begin_scoped(&self.db, company_id).await?;
        let invoice = find_proforma(&txn, company_id, invoice_id, true).await?;
        let status: ProformaStatus = stored_status(&invoice.status)?;
        ConversionService::proforma_to_order(status, invoice.export_order_id)?;

        let lines: Vec<LineItem> = load_proforma_items(&txn, invoice_id)
            .await?
            .iter()
            .map(proforma_line)
            .collect();
        let total = document_total(&lines)?;

        let order_id = Uuid::new_v4();
        let at = timestamp(now);
        let order = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::ExportOrder),
            self.options.workflow.numbering_retry_budget,
            |number| export_orders::ActiveModel {
                id: Set(order_id),
                company_id: Set(company_id.into_inner()),
                order_number: Set(number),
                status: Set(ExportOrderStatus::Pending.as_str().to_string()),
                proforma_invoice_id: Set(Some(invoice_id)),
                buyer_name: Set(invoice.buyer_name.clone()),
                currency: Set(invoice.currency.clone()),
                order_date: Set(now.date_naive()),
                total_amount: Set(total),
                approved_by: Set(None),
                approved_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(at),
                updated_at: Set(at),
            },
        )
        .await?;
        let items = insert_order_items(&txn, order_id, &lines).await?;

        let mut active: proforma_invoices::ActiveModel = invoice.into();
        active.export_order_id = Set(Some(order_id));
        active.updated_at = Set(at);
        active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            invoice_id = %invoice_id,
            order_id = %order_id,
            number = %order.order_number,
            "Proforma invoice converted to export order"
        );
        self.options.publish(&converted_event(
            company_id,
            DocumentType::ProformaInvoice,
            invoice_id,
            Some(DocumentType::ExportOrder),
            order_id,
            &order.order_number,
        ));
        Ok(ExportOrderDetail { order, items })
    }

    /// Raises a drafted shipping bill against an export order.
    ///
    /// An order may carry several bills. FOB defaults to the order total.
    ///
    /// # Errors
    ///
    /// * `Validation` if a charge is negative.
    /// * `InvalidState` unless the order is between approved and shipped.
    pub async fn order_to_shipping_bill(
        &self,
        company_id: CompanyId,
        order_id: Uuid,
        actor: UserId,
        input: ShippingBillInput,
    ) -> Result<shipping_bills::Model, WorkflowError> {
        input.validate()?;

        let txn = begin_scoped(&self.db, company_id).await?;
        let order = find_order(&txn, company_id, order_id, true).await?;
        let status: ExportOrderStatus = stored_status(&order.status)?;
        ConversionService::order_to_shipping_bill(status)?;

        let bill_id = Uuid::new_v4();
        let at = timestamp(Utc::now());
        let fob_value = input.fob_value.unwrap_or(order.total_amount);
        let port_code = non_blank(input.port_code.clone()).map(|p| p.to_uppercase());
        let bill = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::ShippingBill),
            self.options.workflow.numbering_retry_budget,
            |number| shipping_bills::ActiveModel {
                id: Set(bill_id),
                company_id: Set(company_id.into_inner()),
                sb_number: Set(number),
                status: Set(ShippingBillStatus::Drafted.as_str().to_string()),
                export_order_id: Set(order_id),
                port_code: Set(port_code.clone()),
                currency: Set(order.currency.clone()),
                fob_value: Set(fob_value),
                freight: Set(input.freight),
                insurance: Set(input.insurance),
                filed_by: Set(None),
                filed_at: Set(None),
                rejected_by: Set(None),
                rejected_at: Set(None),
                rejection_reason: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(at),
                updated_at: Set(at),
            },
        )
        .await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            order_id = %order_id,
            shipping_bill_id = %bill_id,
            number = %bill.sb_number,
            fob_value = %fob_value,
            "Export order converted to shipping bill"
        );
        self.options.publish(&converted_event(
            company_id,
            DocumentType::ExportOrder,
            order_id,
            Some(DocumentType::ShippingBill),
            bill_id,
            &bill.sb_number,
        ));
        Ok(bill)
    }
}
