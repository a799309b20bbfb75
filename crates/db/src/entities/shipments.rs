//! `SeaORM` Entity for shipments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub export_order_id: Uuid,
    pub shipping_bill_id: Option<Uuid>,
    pub status: String,
    pub shipment_date: Date,
    pub incoterm: Option<String>,
    pub carrier: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shipment_items::Entity")]
    ShipmentItems,
}

impl Related<super::shipment_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
