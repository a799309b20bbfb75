//! `SeaORM` Entity for purchase_orders table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub po_number: String,
    pub status: String,
    pub payment_status: String,
    pub vendor_name: String,
    pub currency: String,
    pub order_date: Date,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(has_many = "super::purchase_order_items::Entity")]
    PurchaseOrderItems,
    #[sea_orm(has_many = "super::purchase_order_payments::Entity")]
    PurchaseOrderPayments,
}

impl Related<super::purchase_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItems.def()
    }
}

impl Related<super::purchase_order_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
