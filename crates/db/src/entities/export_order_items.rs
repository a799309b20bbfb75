//! `SeaORM` Entity for export_order_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "export_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub export_order_id: Uuid,
    pub position: i32,
    pub sku_id: Option<Uuid>,
    pub description: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::export_orders::Entity",
        from = "Column::ExportOrderId",
        to = "super::export_orders::Column::Id"
    )]
    ExportOrders,
}

impl Related<super::export_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExportOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
