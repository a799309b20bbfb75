//! `SeaORM` Entity for proforma_invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proforma_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub invoice_number: String,
    pub invoice_type: String,
    pub status: String,
    pub version: i32,
    pub quote_id: Option<Uuid>,
    pub export_order_id: Option<Uuid>,
    pub buyer_name: String,
    pub buyer_address: Option<String>,
    pub currency: String,
    pub issue_date: Date,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub converted_to_commercial_at: Option<DateTimeWithTimeZone>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::proforma_invoice_items::Entity")]
    ProformaInvoiceItems,
}

impl Related<super::proforma_invoice_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProformaInvoiceItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
