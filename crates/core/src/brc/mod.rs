//! Bank realization certificate (BRC) tracking.
//!
//! A BRC records foreign exchange realized against a filed shipping bill.
//! Payments arrive in parts; the pending amount and realization status are
//! always recomputed from the full payment history, never adjusted in place.

pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use service::BrcService;
pub use types::{
    BrcSummary, ComplianceEntry, ComplianceSnapshot, PaymentRequest, Realization, ValidPayment,
};
