//! `SeaORM` Entity for brc_payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "brc_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub brc_id: Uuid,
    pub amount: Decimal,
    pub payment_date: Date,
    pub reference: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub inr_amount: Option<Decimal>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brcs::Entity",
        from = "Column::BrcId",
        to = "super::brcs::Column::Id"
    )]
    Brcs,
}

impl Related<super::brcs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brcs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
