//! Shared types, errors, and configuration for Eximflow.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision and minor-unit conversion
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation for the identity collaborator

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, WorkflowConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
