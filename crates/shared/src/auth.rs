//! Identity claims carried by access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Company the session was opened for.
    pub company: Uuid,
    /// User's role in the company.
    pub role: String,
    /// Platform super-admin flag.
    #[serde(default)]
    pub super_admin: bool,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, company_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            company: company_id,
            role: role.to_string(),
            super_admin: false,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Marks the claims as belonging to a platform super-admin.
    #[must_use]
    pub fn with_super_admin(mut self, super_admin: bool) -> Self {
        self.super_admin = super_admin;
        self
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the company ID from claims.
    #[must_use]
    pub const fn company_id(&self) -> Uuid {
        self.company
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(user_id, company_id, "admin", expires_at);

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.company_id(), company_id);
        assert_eq!(claims.role, "admin");
        assert!(!claims.super_admin);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_super_admin_flag_defaults_to_false_when_absent() {
        let json = format!(
            r#"{{"sub":"{}","company":"{}","role":"viewer","iat":0,"exp":1}}"#,
            Uuid::nil(),
            Uuid::nil()
        );
        let claims: Claims = serde_json::from_str(&json).unwrap();
        assert!(!claims.super_admin);
    }
}
