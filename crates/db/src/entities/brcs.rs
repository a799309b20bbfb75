//! `SeaORM` Entity for brcs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "brcs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub shipping_bill_id: Uuid,
    pub brc_number: Option<String>,
    pub currency: String,
    pub total_expected: Decimal,
    pub pending_amount: Decimal,
    pub realization_status: String,
    pub due_date: Date,
    pub is_overdue: bool,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipping_bills::Entity",
        from = "Column::ShippingBillId",
        to = "super::shipping_bills::Column::Id"
    )]
    ShippingBills,
    #[sea_orm(has_many = "super::brc_payments::Entity")]
    BrcPayments,
}

impl Related<super::shipping_bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingBills.def()
    }
}

impl Related<super::brc_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BrcPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
