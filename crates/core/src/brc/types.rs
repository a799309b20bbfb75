//! BRC domain types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::types::RealizationStatus;

/// A payment as submitted. Amount and date are optional so that their
/// absence is reported as a validation error rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequest {
    /// Amount in the BRC currency.
    pub amount: Option<Decimal>,
    /// Date the bank credited the payment.
    pub payment_date: Option<NaiveDate>,
    /// Bank reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Rate to INR, if known.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
}

/// A payment that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidPayment {
    /// Amount in the BRC currency.
    pub amount: Decimal,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Bank reference.
    pub reference: Option<String>,
    /// Rate to INR.
    pub exchange_rate: Option<Decimal>,
    /// `amount * exchange_rate`, rounded to 2 places.
    pub inr_amount: Option<Decimal>,
}

/// Derived realization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Realization {
    /// Sum of payments.
    pub realized: Decimal,
    /// `total - realized`.
    pub pending_amount: Decimal,
    /// Status from the pending amount.
    pub status: RealizationStatus,
}

/// What the compliance report needs to know about one BRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrcSummary {
    /// BRC ID.
    pub id: Uuid,
    /// Bank reference number.
    pub brc_number: Option<String>,
    /// Shipping bill the BRC realizes.
    pub shipping_bill_id: Uuid,
    /// Total expected.
    pub total_expected: Decimal,
    /// Still pending.
    pub pending_amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Realization deadline.
    pub due_date: NaiveDate,
    /// Realization status.
    pub status: RealizationStatus,
}

/// One BRC in a compliance bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceEntry {
    /// BRC ID.
    pub id: Uuid,
    /// Bank reference number.
    pub brc_number: Option<String>,
    /// Shipping bill ID.
    pub shipping_bill_id: Uuid,
    /// Due date.
    pub due_date: NaiveDate,
    /// Pending amount.
    pub pending_amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Realization status.
    pub status: RealizationStatus,
    /// Whole days until due, rounded up; negative once past.
    pub days_remaining: i64,
    /// Past due and not fully realized.
    pub is_overdue: bool,
}

/// Company-wide BRC compliance picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceSnapshot {
    /// Number of BRCs.
    pub total: u64,
    /// Count with no payment.
    pub pending: u64,
    /// Count partially realized.
    pub partial: u64,
    /// Count fully realized.
    pub full: u64,
    /// Overdue BRCs, oldest due date first.
    pub overdue: Vec<ComplianceEntry>,
    /// BRCs due within the window, soonest first.
    pub upcoming_due: Vec<ComplianceEntry>,
    /// Sum of expected amounts.
    pub total_expected: Decimal,
    /// Sum realized.
    pub total_realized: Decimal,
    /// Sum pending.
    pub total_pending: Decimal,
}
