//! `SeaORM` Entity for proforma_invoice_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proforma_invoice_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub proforma_invoice_id: Uuid,
    pub position: i32,
    pub sku_id: Option<Uuid>,
    pub description: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub tax_percent: Decimal,
    pub net_weight: Option<Decimal>,
    pub gross_weight: Option<Decimal>,
    pub line_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::proforma_invoices::Entity",
        from = "Column::ProformaInvoiceId",
        to = "super::proforma_invoices::Column::Id"
    )]
    ProformaInvoices,
}

impl Related<super::proforma_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProformaInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
