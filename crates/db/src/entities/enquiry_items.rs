//! `SeaORM` Entity for enquiry_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enquiry_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub enquiry_id: Uuid,
    pub position: i32,
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub expected_price: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enquiries::Entity",
        from = "Column::EnquiryId",
        to = "super::enquiries::Column::Id"
    )]
    Enquiries,
}

impl Related<super::enquiries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enquiries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
