//! `SeaORM` Entity for export_orders table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "export_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub proforma_invoice_id: Option<Uuid>,
    pub buyer_name: String,
    pub currency: String,
    pub order_date: Date,
    pub total_amount: Decimal,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::export_order_items::Entity")]
    ExportOrderItems,
    #[sea_orm(has_many = "super::shipping_bills::Entity")]
    ShippingBills,
}

impl Related<super::export_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExportOrderItems.def()
    }
}

impl Related<super::shipping_bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingBills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
