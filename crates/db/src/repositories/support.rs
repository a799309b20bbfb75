//! Helpers shared by the document repositories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eximflow_core::notify::{NoopNotifier, NotificationSink, WorkflowEvent};
use eximflow_core::workflow::{Lifecycle, Transition};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_shared::WorkflowConfig;
use eximflow_shared::types::CompanyId;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait};
use uuid::Uuid;

use crate::rls::set_rls_context;

/// Wraps a `SeaORM` error.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn db_err(e: DbErr) -> WorkflowError {
    WorkflowError::Database(e.to_string())
}

/// True if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Parses a stored status column.
pub(crate) fn stored_status<S: Lifecycle>(raw: &str) -> Result<S, WorkflowError> {
    S::parse_status(raw).ok_or_else(|| {
        WorkflowError::Database(format!("Unknown {} status '{raw}' in storage", S::DOCUMENT))
    })
}

/// Current time as the column type.
pub(crate) fn timestamp(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

/// Begins a transaction scoped to `company_id`.
pub(crate) async fn begin_scoped(
    db: &DatabaseConnection,
    company_id: CompanyId,
) -> Result<DatabaseTransaction, WorkflowError> {
    let txn = db.begin().await.map_err(db_err)?;
    set_rls_context(&txn, company_id).await.map_err(db_err)?;
    Ok(txn)
}

/// Builds the event for a committed status change.
pub(crate) fn status_event<S: Lifecycle>(
    company_id: CompanyId,
    id: Uuid,
    number: &str,
    transition: &Transition<S>,
) -> WorkflowEvent {
    WorkflowEvent::StatusChanged {
        company_id: company_id.into_inner(),
        document: S::DOCUMENT,
        id,
        number: number.to_string(),
        from: transition.from.to_string(),
        to: transition.to.to_string(),
        actor: transition.actor,
    }
}

/// Builds the event for a committed conversion.
pub(crate) fn converted_event(
    company_id: CompanyId,
    source: DocumentType,
    source_id: Uuid,
    target: Option<DocumentType>,
    target_id: Uuid,
    number: &str,
) -> WorkflowEvent {
    WorkflowEvent::DocumentConverted {
        company_id: company_id.into_inner(),
        source,
        source_id,
        target,
        target_id,
        number: number.to_string(),
    }
}

/// Options every document repository carries.
#[derive(Clone)]
pub(crate) struct RepoOptions {
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) workflow: WorkflowConfig,
}

impl Default for RepoOptions {
    fn default() -> Self {
        Self {
            notifier: Arc::new(NoopNotifier),
            workflow: WorkflowConfig::default(),
        }
    }
}

impl std::fmt::Debug for RepoOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoOptions")
            .field("workflow", &self.workflow)
            .finish_non_exhaustive()
    }
}

impl RepoOptions {
    pub(crate) fn publish(&self, event: &WorkflowEvent) {
        self.notifier.publish(event);
    }
}

/// A page of rows plus the total row count.
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total: u64,
}

/// Generates the `with_notifier` and `with_workflow_config` builders.
macro_rules! repo_options {
    ($repo:ident) => {
        impl $repo {
            /// Publishes workflow events to `notifier` after each commit.
            #[must_use]
            pub fn with_notifier(
                mut self,
                notifier: std::sync::Arc<dyn eximflow_core::notify::NotificationSink>,
            ) -> Self {
                self.options.notifier = notifier;
                self
            }

            /// Applies numbering retries, quote validity and BRC windows.
            #[must_use]
            pub fn with_workflow_config(
                mut self,
                config: eximflow_shared::WorkflowConfig,
            ) -> Self {
                self.options.workflow = config;
                self
            }
        }
    };
}

pub(crate) use repo_options;

/// Filters accepted by the list operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    /// Only rows in this status.
    #[serde(default)]
    pub status: Option<String>,
}

impl DocumentFilter {
    /// The status filter parsed against the lifecycle of `S`.
    pub(crate) fn parsed_status<S: Lifecycle>(&self) -> Result<Option<S>, WorkflowError> {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                S::parse_status(s).ok_or_else(|| {
                    WorkflowError::validation(format!("Invalid status '{s}' for {}", S::DOCUMENT))
                })
            })
            .transpose()
    }
}

/// Trims an optional text field to `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fails with a validation error when `value` is blank.
pub(crate) fn required(value: &str, field: &str) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eximflow_core::workflow::QuoteStatus;

    #[test]
    fn test_filter_parses_known_status() {
        let filter = DocumentFilter {
            status: Some("Pending_Approval".to_string()),
        };
        assert_eq!(
            filter.parsed_status::<QuoteStatus>().unwrap(),
            Some(QuoteStatus::PendingApproval)
        );
    }

    #[test]
    fn test_filter_rejects_unknown_status() {
        let filter = DocumentFilter {
            status: Some("archived".to_string()),
        };
        assert!(matches!(
            filter.parsed_status::<QuoteStatus>(),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_filter_is_ignored() {
        let filter = DocumentFilter {
            status: Some("  ".to_string()),
        };
        assert_eq!(filter.parsed_status::<QuoteStatus>().unwrap(), None);
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(non_blank(Some("  x ".into())), Some("x".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert!(required(" ", "Buyer name").is_err());
        assert_eq!(required(" Acme ", "Buyer name").unwrap(), "Acme");
    }
}
