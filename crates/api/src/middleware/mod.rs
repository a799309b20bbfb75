//! Request middleware: bearer-token authentication, then tenancy resolution.

pub mod auth;
pub mod tenancy;

pub use auth::auth_middleware;
pub use tenancy::{Tenant, tenancy_middleware};
