//! Workflow error types.
//!
//! One error enum covers every workflow operation (transitions, numbering,
//! conversions, payments and tenancy resolution) so that callers map a single
//! type onto HTTP responses.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::{DocumentType, WorkflowAction};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No authenticated principal.
    #[error("Authentication required")]
    Unauthorized,

    /// The principal is not attached to any company.
    #[error("No company associated with the current user")]
    CompanyNotFound,

    /// Entity missing, or owned by another company.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity label.
        entity: &'static str,
        /// The requested ID.
        id: Uuid,
    },

    /// The document is not in a status the action accepts.
    #[error("Cannot {} {document} with status: {current} (attempted: {attempted})", .action.verb())]
    InvalidState {
        /// The document type.
        document: DocumentType,
        /// The attempted action.
        action: WorkflowAction,
        /// The current status.
        current: String,
        /// The status (or outcome) the action would have produced.
        attempted: String,
    },

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A payment is larger than what is still outstanding.
    #[error("Payment amount {amount} exceeds pending amount {pending}")]
    AmountExceedsPending {
        /// The payment amount.
        amount: Decimal,
        /// The outstanding amount.
        pending: Decimal,
    },

    /// The conversion has already happened.
    #[error("{0}")]
    AlreadyConverted(String),

    /// A unique document number could not be allocated.
    #[error("Could not allocate a unique {document} number after {attempts} attempts")]
    NumberingConflict {
        /// The document type.
        document: DocumentType,
        /// How many inserts were tried.
        attempts: u32,
    },

    /// The caller's company role does not allow the operation.
    #[error("Role {role} is not allowed to {operation}")]
    Forbidden {
        /// The caller's role.
        role: String,
        /// What was attempted.
        operation: &'static str,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing entity.
    #[must_use]
    pub const fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden { .. } => 403,
            Self::CompanyNotFound | Self::NotFound { .. } => 404,
            Self::InvalidState { .. } | Self::AlreadyConverted(_) | Self::NumberingConflict { .. } => {
                409
            }
            Self::Validation(_) => 400,
            Self::AmountExceedsPending { .. } => 422,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::CompanyNotFound => "COMPANY_NOT_FOUND",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AmountExceedsPending { .. } => "AMOUNT_EXCEEDS_PENDING",
            Self::AlreadyConverted(_) => "ALREADY_CONVERTED",
            Self::NumberingConflict { .. } => "NUMBERING_CONFLICT",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_state_message_names_both_statuses() {
        let err = WorkflowError::InvalidState {
            document: DocumentType::ProformaInvoice,
            action: WorkflowAction::Approve,
            current: "rejected".to_string(),
            attempted: "approved".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot approve proforma invoice with status: rejected (attempted: approved)"
        );
    }

    #[test]
    fn test_update_status_message() {
        let err = WorkflowError::InvalidState {
            document: DocumentType::ExportOrder,
            action: WorkflowAction::UpdateStatus,
            current: "pending".to_string(),
            attempted: "shipped".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot update status of export order with status: pending (attempted: shipped)"
        );
    }

    #[rstest]
    #[case(WorkflowError::Unauthorized, 401, "UNAUTHORIZED")]
    #[case(WorkflowError::CompanyNotFound, 404, "COMPANY_NOT_FOUND")]
    #[case(WorkflowError::not_found("quote", Uuid::nil()), 404, "NOT_FOUND")]
    #[case(WorkflowError::validation("bad"), 400, "VALIDATION_ERROR")]
    #[case(
        WorkflowError::AmountExceedsPending { amount: dec!(10), pending: dec!(5) },
        422,
        "AMOUNT_EXCEEDS_PENDING"
    )]
    #[case(WorkflowError::AlreadyConverted("done".into()), 409, "ALREADY_CONVERTED")]
    #[case(
        WorkflowError::NumberingConflict { document: DocumentType::Quote, attempts: 5 },
        409,
        "NUMBERING_CONFLICT"
    )]
    #[case(
        WorkflowError::Forbidden { role: "viewer".into(), operation: "approve documents" },
        403,
        "FORBIDDEN"
    )]
    #[case(WorkflowError::Database("down".into()), 500, "DATABASE_ERROR")]
    fn test_status_and_code(
        #[case] err: WorkflowError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_not_found_message() {
        let err = WorkflowError::not_found("brc", Uuid::nil());
        assert_eq!(
            err.to_string(),
            "brc 00000000-0000-0000-0000-000000000000 not found"
        );
    }
}
