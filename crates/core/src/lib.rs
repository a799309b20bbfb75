//! Core workflow logic for Eximflow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Document lifecycles, numbering rules, conversion preconditions and BRC
//! realization math live here; the `db` crate persists what these functions decide.
//!
//! # Modules
//!
//! - `workflow` - Status enums, transition tables and the lifecycle engine
//! - `numbering` - Document number format and sequence rules
//! - `conversion` - Preconditions for turning one document into the next
//! - `pricing` - Line totals, document totals, payment status
//! - `shipment` - Remaining shippable quantities
//! - `brc` - Bank realization tracking and compliance buckets
//! - `stats` - Status buckets, trends and conversion rates
//! - `tenancy` - Principal to company resolution and role checks
//! - `notify` - Workflow event sink
//! - `render` - Document rendering port

pub mod brc;
pub mod conversion;
pub mod notify;
pub mod numbering;
pub mod pricing;
pub mod render;
pub mod shipment;
pub mod stats;
pub mod tenancy;
pub mod workflow;

pub use workflow::{DocumentType, WorkflowAction, WorkflowError, WorkflowService};
