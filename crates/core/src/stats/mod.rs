//! Per-document-type statistics.
//!
//! Pure aggregation over groups the storage layer hands in: zero-filled
//! status buckets, value totals, average value, conversion rate and a daily
//! trend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use eximflow_shared::types::round_money;

use crate::workflow::types::DocumentType;

/// Documents sharing a status, a creation day and a conversion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    /// Status text.
    pub status: String,
    /// Creation day (UTC).
    pub day: NaiveDate,
    /// Set when conversion is recorded outside the status column.
    pub converted: bool,
    /// Documents in the group.
    pub count: u64,
    /// Sum of their values.
    pub amount: Decimal,
}

/// Count and value for one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBucket {
    /// Status text.
    pub status: &'static str,
    /// Number of documents.
    pub count: u64,
    /// Sum of values.
    pub value: Decimal,
}

/// One day of the trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Calendar day (UTC).
    pub date: NaiveDate,
    /// Documents created that day.
    pub count: u64,
    /// Value created that day.
    pub value: Decimal,
}

/// Aggregated statistics for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    /// Document type.
    pub document_type: DocumentType,
    /// Total documents.
    pub total_count: u64,
    /// Total value.
    pub total_value: Decimal,
    /// `total_value / total_count`, 0 when empty.
    pub average_value: Decimal,
    /// Converted documents per hundred, 0 when empty.
    pub conversion_rate: Decimal,
    /// Every status of the type, in lifecycle order.
    pub by_status: Vec<StatusBucket>,
    /// Daily series, oldest first.
    pub trend: Vec<TrendPoint>,
}

/// Stateless statistics aggregation.
pub struct StatsService;

impl StatsService {
    /// Aggregates grouped rows of one document type.
    ///
    /// Groups whose status is not a status of `document_type` still count
    /// toward totals but land in no bucket.
    #[must_use]
    pub fn summarize(document_type: DocumentType, rows: &[StatRow]) -> DocumentStats {
        let mut by_status: Vec<StatusBucket> = document_type
            .statuses()
            .iter()
            .copied()
            .map(|status| StatusBucket {
                status,
                count: 0,
                value: Decimal::ZERO,
            })
            .collect();
        let converted_statuses = document_type.converted_statuses();

        let mut trend: BTreeMap<NaiveDate, (u64, Decimal)> = BTreeMap::new();
        let mut total_count: u64 = 0;
        let mut total_value = Decimal::ZERO;
        let mut converted: u64 = 0;

        for row in rows {
            let status = row.status.trim().to_lowercase();
            if let Some(bucket) = by_status.iter_mut().find(|b| b.status == status) {
                bucket.count += row.count;
                bucket.value += row.amount;
            }
            if row.converted || converted_statuses.iter().any(|s| *s == status) {
                converted += row.count;
            }
            total_count += row.count;
            total_value += row.amount;

            let day = trend.entry(row.day).or_default();
            day.0 += row.count;
            day.1 += row.amount;
        }

        let (average_value, conversion_rate) = if total_count == 0 {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let count = Decimal::from(total_count);
            (
                round_money(total_value / count),
                round_money(Decimal::from(converted) * Decimal::ONE_HUNDRED / count),
            )
        };

        DocumentStats {
            document_type,
            total_count,
            total_value,
            average_value,
            conversion_rate,
            by_status,
            trend: trend
                .into_iter()
                .map(|(date, (count, value))| TrendPoint { date, count, value })
                .collect(),
        }
    }
}
