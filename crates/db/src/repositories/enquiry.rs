//! Enquiry repository.

use chrono::Utc;
use eximflow_core::pricing::EnquiryLine;
use eximflow_core::workflow::{EnquiryPriority, EnquiryStatus, WorkflowService};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::types::{CompanyId, PageRequest, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{enquiries, enquiry_items};

use super::numbering::{NumberScope, insert_numbered};
use super::support::{
    DocumentFilter, ListPage, RepoOptions, begin_scoped, db_err, non_blank, repo_options,
    required, status_event, stored_status, timestamp,
};

/// Input for creating an enquiry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnquiryInput {
    /// Customer contact name.
    pub customer_name: String,
    /// Customer email.
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Customer phone.
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Customer's company.
    #[serde(default)]
    pub customer_company: Option<String>,
    /// Where the enquiry came from (trade fair, website, ...).
    #[serde(default)]
    pub source: Option<String>,
    /// Priority.
    #[serde(default)]
    pub priority: EnquiryPriority,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Requested products.
    #[serde(default)]
    pub items: Vec<EnquiryLine>,
}

/// An enquiry with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct EnquiryDetail {
    /// The enquiry row.
    #[serde(flatten)]
    pub enquiry: enquiries::Model,
    /// Lines in position order.
    pub items: Vec<enquiry_items::Model>,
}

impl EnquiryDetail {
    /// Lines as pricing input.
    #[must_use]
    pub fn lines(&self) -> Vec<EnquiryLine> {
        self.items
            .iter()
            .map(|item| EnquiryLine {
                product_id: item.product_id,
                description: item.description.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                expected_price: item.expected_price,
            })
            .collect()
    }
}

fn validate_lines(items: &[EnquiryLine]) -> Result<(), WorkflowError> {
    items.iter().try_for_each(EnquiryLine::validate)
}

/// Loads an enquiry owned by `company_id`, optionally locking it.
pub(crate) async fn find_enquiry<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: Uuid,
    lock: bool,
) -> Result<enquiries::Model, WorkflowError> {
    let mut query = enquiries::Entity::find_by_id(id)
        .filter(enquiries::Column::CompanyId.eq(company_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::not_found("enquiry", id))
}

pub(crate) async fn load_enquiry_items<C: ConnectionTrait>(
    conn: &C,
    enquiry_id: Uuid,
) -> Result<Vec<enquiry_items::Model>, WorkflowError> {
    enquiry_items::Entity::find()
        .filter(enquiry_items::Column::EnquiryId.eq(enquiry_id))
        .order_by_asc(enquiry_items::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Enquiry repository.
#[derive(Debug, Clone)]
pub struct EnquiryRepository {
    db: DatabaseConnection,
    options: RepoOptions,
}

repo_options!(EnquiryRepository);

impl EnquiryRepository {
    /// Creates a new enquiry repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            options: RepoOptions::default(),
        }
    }

    /// Creates an enquiry with a fresh `ENQ` number.
    ///
    /// # Errors
    ///
    /// * `Validation` if the customer name is blank or a line is invalid.
    /// * `NumberingConflict` if no unique number could be allocated.
    pub async fn create(
        &self,
        company_id: CompanyId,
        actor: UserId,
        input: CreateEnquiryInput,
    ) -> Result<EnquiryDetail, WorkflowError> {
        let customer_name = required(&input.customer_name, "Customer name")?;
        validate_lines(&input.items)?;

        let txn = begin_scoped(&self.db, company_id).await?;
        let now = timestamp(Utc::now());
        let id = Uuid::new_v4();

        let enquiry = insert_numbered(
            &txn,
            NumberScope::current(company_id, DocumentType::Enquiry),
            self.options.workflow.numbering_retry_budget,
            |number| enquiries::ActiveModel {
                id: Set(id),
                company_id: Set(company_id.into_inner()),
                enquiry_number: Set(number),
                status: Set(EnquiryStatus::New.as_str().to_string()),
                priority: Set(input.priority.as_str().to_string()),
                source: Set(non_blank(input.source.clone())),
                customer_name: Set(customer_name.clone()),
                customer_email: Set(non_blank(input.customer_email.clone())),
                customer_phone: Set(non_blank(input.customer_phone.clone())),
                customer_company: Set(non_blank(input.customer_company.clone())),
                notes: Set(non_blank(input.notes.clone())),
                quote_id: Set(None),
                converted_at: Set(None),
                created_by: Set(actor.into_inner()),
                created_at: Set(now),
                updated_at: Set(now),
            },
        )
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (position, line) in (1..).zip(input.items) {
            let item = enquiry_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                enquiry_id: Set(id),
                position: Set(position),
                product_id: Set(line.product_id),
                description: Set(line.description.trim().to_string()),
                quantity: Set(line.quantity),
                unit: Set(line.unit),
                expected_price: Set(line.expected_price),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            items.push(item);
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            enquiry_id = %id,
            number = %enquiry.enquiry_number,
            "Enquiry created"
        );
        Ok(EnquiryDetail { enquiry, items })
    }

    /// Gets an enquiry with its lines.
    ///
    /// # Errors
    ///
    /// `NotFound` if the enquiry does not exist in the company.
    pub async fn get(&self, company_id: CompanyId, id: Uuid) -> Result<EnquiryDetail, WorkflowError> {
        let enquiry = find_enquiry(&self.db, company_id, id, false).await?;
        let items = load_enquiry_items(&self.db, id).await?;
        Ok(EnquiryDetail { enquiry, items })
    }

    /// Lists enquiries, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if the status filter is not an enquiry status.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &DocumentFilter,
        page: &PageRequest,
    ) -> Result<ListPage<enquiries::Model>, WorkflowError> {
        let mut query = enquiries::Entity::find()
            .filter(enquiries::Column::CompanyId.eq(company_id.into_inner()));
        if let Some(status) = filter.parsed_status::<EnquiryStatus>()? {
            query = query.filter(enquiries::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let items = query
            .order_by_desc(enquiries::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(ListPage { items, total })
    }

    /// Moves an enquiry to `new_status`.
    ///
    /// Open enquiries (new, contacted, quoted) may move to any status; closed
    /// ones are final.
    ///
    /// # Errors
    ///
    /// * `Validation` if `new_status` is not an enquiry status.
    /// * `InvalidState` if the enquiry is closed.
    pub async fn update_status(
        &self,
        company_id: CompanyId,
        id: Uuid,
        actor: UserId,
        new_status: &str,
    ) -> Result<enquiries::Model, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let enquiry = find_enquiry(&txn, company_id, id, true).await?;
        let current: EnquiryStatus = stored_status(&enquiry.status)?;
        let transition =
            WorkflowService::update_status(current, new_status, actor.into_inner(), Utc::now())?;

        let number = enquiry.enquiry_number.clone();
        let mut active: enquiries::ActiveModel = enquiry.into();
        active.status = Set(transition.to.as_str().to_string());
        if transition.to == EnquiryStatus::Converted {
            active.converted_at = Set(Some(timestamp(transition.at)));
        }
        active.updated_at = Set(timestamp(transition.at));
        let updated = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(enquiry_id = %id, from = %transition.from, to = %transition.to, "Enquiry status updated");
        self.options
            .publish(&status_event(company_id, id, &number, &transition));
        Ok(updated)
    }
}
