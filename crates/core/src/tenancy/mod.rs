//! Identity and tenancy gate.
//!
//! Resolves an authenticated principal to the company every subsequent
//! operation is scoped to, and answers role questions for that company.

use serde::{Deserialize, Serialize};

use eximflow_shared::types::{CompanyId, UserId};

use crate::workflow::error::WorkflowError;

/// User roles within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyRole {
    /// Full access, can transfer ownership.
    Owner,
    /// Full access except ownership transfer.
    Admin,
    /// Can approve and reject documents.
    Manager,
    /// Can create and edit documents.
    Staff,
    /// Read-only access.
    Viewer,
}

impl CompanyRole {
    /// Returns true if this role can approve or reject documents.
    #[must_use]
    pub const fn can_approve(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Manager)
    }

    /// Returns true if this role can create documents and move them along.
    #[must_use]
    pub const fn can_edit(&self) -> bool {
        !matches!(self, Self::Viewer)
    }

    /// Returns true if this role can run maintenance sweeps.
    #[must_use]
    pub const fn can_administer(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
        }
    }

    /// Parses a role, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "staff" => Some(Self::Staff),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompanyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller, as vouched for by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// User ID.
    pub user_id: UserId,
    /// Company the session was opened for.
    pub company_hint: Option<CompanyId>,
    /// Platform super-admin.
    pub is_super_admin: bool,
}

/// A user's membership of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    /// Company ID.
    pub company_id: CompanyId,
    /// Role in the company.
    pub role: CompanyRole,
}

/// Who is acting, and for which company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// Acting user.
    pub user_id: UserId,
    /// Company all reads and writes are scoped to.
    pub company_id: CompanyId,
    /// Role in that company.
    pub role: CompanyRole,
    /// Platform super-admin.
    pub is_super_admin: bool,
}

impl RequestContext {
    /// Fails unless the caller may create or edit documents.
    pub fn require_edit(&self) -> Result<(), WorkflowError> {
        if self.is_super_admin || self.role.can_edit() {
            Ok(())
        } else {
            Err(self.forbidden("modify documents"))
        }
    }

    /// Fails unless the caller may approve or reject documents.
    pub fn require_approve(&self) -> Result<(), WorkflowError> {
        if self.is_super_admin || self.role.can_approve() {
            Ok(())
        } else {
            Err(self.forbidden("approve or reject documents"))
        }
    }

    /// Fails unless the caller may run company administration.
    pub fn require_admin(&self) -> Result<(), WorkflowError> {
        if self.is_super_admin || self.role.can_administer() {
            Ok(())
        } else {
            Err(self.forbidden("run maintenance"))
        }
    }

    fn forbidden(&self, operation: &'static str) -> WorkflowError {
        WorkflowError::Forbidden {
            role: self.role.to_string(),
            operation,
        }
    }
}

/// Resolves principals to request contexts.
pub struct TenancyGate;

impl TenancyGate {
    /// Resolves `principal` against its membership record.
    ///
    /// A super-admin without a membership acts as owner of the company named
    /// in the session.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without a principal, `CompanyNotFound` without a company.
    pub fn resolve(
        principal: Option<&Principal>,
        membership: Option<Membership>,
    ) -> Result<RequestContext, WorkflowError> {
        let principal = principal.ok_or(WorkflowError::Unauthorized)?;

        let membership = match (membership, principal.company_hint) {
            (Some(m), _) => m,
            (None, Some(company_id)) if principal.is_super_admin => Membership {
                company_id,
                role: CompanyRole::Owner,
            },
            _ => return Err(WorkflowError::CompanyNotFound),
        };

        Ok(RequestContext {
            user_id: principal.user_id,
            company_id: membership.company_id,
            role: membership.role,
            is_super_admin: principal.is_super_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(super_admin: bool) -> Principal {
        Principal {
            user_id: UserId::new(),
            company_hint: Some(CompanyId::new()),
            is_super_admin: super_admin,
        }
    }

    #[test]
    fn test_role_permissions() {
        assert!(CompanyRole::Owner.can_approve());
        assert!(CompanyRole::Manager.can_approve());
        assert!(!CompanyRole::Staff.can_approve());
        assert!(CompanyRole::Staff.can_edit());
        assert!(!CompanyRole::Viewer.can_edit());
        assert!(CompanyRole::Admin.can_administer());
        assert!(!CompanyRole::Manager.can_administer());
    }

    #[test]
    fn test_role_parse_and_display() {
        for role in [
            CompanyRole::Owner,
            CompanyRole::Admin,
            CompanyRole::Manager,
            CompanyRole::Staff,
            CompanyRole::Viewer,
        ] {
            assert_eq!(CompanyRole::parse(&role.to_string()), Some(role));
        }
        assert_eq!(CompanyRole::parse("ADMIN"), Some(CompanyRole::Admin));
        assert_eq!(CompanyRole::parse("accountant"), None);
    }

    #[test]
    fn test_no_principal_is_unauthorized() {
        let err = TenancyGate::resolve(None, None).unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized));
    }

    #[test]
    fn test_no_membership_is_company_not_found() {
        let p = principal(false);
        let err = TenancyGate::resolve(Some(&p), None).unwrap_err();
        assert!(matches!(err, WorkflowError::CompanyNotFound));
    }

    #[test]
    fn test_membership_scopes_context() {
        let p = principal(false);
        let company_id = CompanyId::new();
        let ctx = TenancyGate::resolve(
            Some(&p),
            Some(Membership {
                company_id,
                role: CompanyRole::Staff,
            }),
        )
        .unwrap();
        assert_eq!(ctx.company_id, company_id);
        assert_eq!(ctx.user_id, p.user_id);
        assert!(ctx.require_edit().is_ok());
        assert_eq!(ctx.require_approve().unwrap_err().error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_super_admin_falls_back_to_session_company() {
        let p = principal(true);
        let ctx = TenancyGate::resolve(Some(&p), None).unwrap();
        assert_eq!(Some(ctx.company_id), p.company_hint);
        assert!(ctx.require_admin().is_ok());
    }

    #[test]
    fn test_viewer_cannot_edit() {
        let ctx = RequestContext {
            user_id: UserId::new(),
            company_id: CompanyId::new(),
            role: CompanyRole::Viewer,
            is_super_admin: false,
        };
        assert!(ctx.require_edit().is_err());
    }
}
