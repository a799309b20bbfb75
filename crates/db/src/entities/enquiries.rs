//! `SeaORM` Entity for enquiries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enquiries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub enquiry_number: String,
    pub status: String,
    pub priority: String,
    pub source: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub notes: Option<String>,
    pub quote_id: Option<Uuid>,
    pub converted_at: Option<DateTimeWithTimeZone>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enquiry_items::Entity")]
    EnquiryItems,
}

impl Related<super::enquiry_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnquiryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
