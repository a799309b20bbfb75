//! `SeaORM` Entity for shipping_bills table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipping_bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub sb_number: String,
    pub status: String,
    pub export_order_id: Uuid,
    pub port_code: Option<String>,
    pub currency: String,
    pub fob_value: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub filed_by: Option<Uuid>,
    pub filed_at: Option<DateTimeWithTimeZone>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::export_orders::Entity",
        from = "Column::ExportOrderId",
        to = "super::export_orders::Column::Id"
    )]
    ExportOrders,
    #[sea_orm(has_many = "super::brcs::Entity")]
    Brcs,
}

impl Related<super::export_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExportOrders.def()
    }
}

impl Related<super::brcs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brcs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
