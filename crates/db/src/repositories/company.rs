//! Company repository for tenants and memberships.

use chrono::Utc;
use eximflow_core::WorkflowError;
use eximflow_core::tenancy::{CompanyRole, Membership};
use eximflow_shared::types::{CompanyId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{companies, company_users};

use super::support::db_err;

/// Company repository for tenant lookup and membership management.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: CompanyId) -> Result<Option<companies::Model>, WorkflowError> {
        companies::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Looks up the membership of `user_id` in `company_id`.
    ///
    /// Inactive companies have no members. A stored role that no longer
    /// parses is treated as no membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn membership(
        &self,
        user_id: UserId,
        company_id: CompanyId,
    ) -> Result<Option<Membership>, WorkflowError> {
        let Some(company) = self.find_by_id(company_id).await? else {
            return Ok(None);
        };
        if !company.is_active {
            return Ok(None);
        }

        let row = company_users::Entity::find_by_id((user_id.into_inner(), company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(row.and_then(|r| {
            let role = CompanyRole::parse(&r.role);
            if role.is_none() {
                tracing::warn!(user_id = %user_id, company_id = %company_id, role = %r.role, "Unknown company role");
            }
            role.map(|role| Membership { company_id, role })
        }))
    }

    /// Creates a company with `owner_id` as its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_with_owner(
        &self,
        name: &str,
        base_currency: &str,
        owner_id: UserId,
    ) -> Result<companies::Model, WorkflowError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::validation("Company name is required"));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now().into();
        let company_id = Uuid::new_v4();

        let company = companies::ActiveModel {
            id: Set(company_id),
            name: Set(name.to_string()),
            base_currency: Set(base_currency.to_uppercase()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        company_users::ActiveModel {
            user_id: Set(owner_id.into_inner()),
            company_id: Set(company_id),
            role: Set(CompanyRole::Owner.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(company_id = %company_id, owner_id = %owner_id, "Company created");
        Ok(company)
    }

    /// Adds a user to a company, or changes their role if already a member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn upsert_member(
        &self,
        company_id: CompanyId,
        user_id: UserId,
        role: CompanyRole,
    ) -> Result<company_users::Model, WorkflowError> {
        let now = Utc::now().into();
        let existing = company_users::Entity::find()
            .filter(company_users::Column::CompanyId.eq(company_id.into_inner()))
            .filter(company_users::Column::UserId.eq(user_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let saved = if let Some(member) = existing {
            let mut active: company_users::ActiveModel = member.into();
            active.role = Set(role.as_str().to_string());
            active.updated_at = Set(now);
            active.update(&self.db).await
        } else {
            company_users::ActiveModel {
                user_id: Set(user_id.into_inner()),
                company_id: Set(company_id.into_inner()),
                role: Set(role.as_str().to_string()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await
        };
        saved.map_err(db_err)
    }
}
