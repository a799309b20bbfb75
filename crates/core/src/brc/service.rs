//! BRC realization rules and compliance buckets.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use eximflow_shared::types::{round_money, to_cents};

use crate::brc::types::{
    BrcSummary, ComplianceEntry, ComplianceSnapshot, PaymentRequest, Realization, ValidPayment,
};
use crate::pricing::{MAX_AMOUNT, payment_amount};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{DocumentType, RealizationStatus, ShippingBillStatus, WorkflowAction};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Shipping bill statuses a BRC may be issued against.
pub const REALIZABLE_BILL_STATUSES: &[ShippingBillStatus] = &[
    ShippingBillStatus::Filed,
    ShippingBillStatus::Cleared,
    ShippingBillStatus::Shipped,
];

/// Stateless BRC calculations.
pub struct BrcService;

impl BrcService {
    /// Validates a payment against the current pending amount.
    ///
    /// The amount is rounded to cents before any check, and the rounded
    /// amount is what gets recorded. It is compared with the pending amount
    /// in integer cents.
    ///
    /// # Errors
    ///
    /// * `Validation` if amount or date is missing, amount is not positive,
    ///   or the exchange rate is not positive.
    /// * `AmountExceedsPending` if the amount is larger than what is pending.
    pub fn validate_payment(
        request: &PaymentRequest,
        pending: Decimal,
    ) -> Result<ValidPayment, WorkflowError> {
        let amount = request
            .amount
            .ok_or_else(|| WorkflowError::validation("Payment amount is required"))?;
        let payment_date = request
            .payment_date
            .ok_or_else(|| WorkflowError::validation("Payment date is required"))?;

        let amount = payment_amount(amount)?;
        if let Some(rate) = request.exchange_rate
            && rate <= Decimal::ZERO
        {
            return Err(WorkflowError::validation("Exchange rate must be positive"));
        }

        let amount_cents = cents(amount)?;
        let pending_cents = cents(pending)?;
        if amount_cents > pending_cents {
            return Err(WorkflowError::AmountExceedsPending { amount, pending });
        }

        let reference = request
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(ToString::to_string);

        Ok(ValidPayment {
            amount,
            payment_date,
            reference,
            exchange_rate: request.exchange_rate,
            inr_amount: request
                .exchange_rate
                .map(|rate| Self::inr_amount(amount, rate))
                .transpose()?,
        })
    }

    /// INR equivalent of a foreign amount.
    ///
    /// # Errors
    ///
    /// `Validation` if the product overflows or does not fit a stored amount.
    pub fn inr_amount(amount: Decimal, rate: Decimal) -> Result<Decimal, WorkflowError> {
        amount
            .checked_mul(rate)
            .map(round_money)
            .filter(|inr| inr.abs() < Decimal::from(MAX_AMOUNT))
            .ok_or_else(|| WorkflowError::validation("INR amount is out of range"))
    }

    /// Recomputes realization from the complete payment history.
    #[must_use]
    pub fn realization(total_expected: Decimal, payments: &[Decimal]) -> Realization {
        let realized: Decimal = payments.iter().copied().sum();
        let pending_amount = total_expected - realized;
        let status = if pending_amount <= Decimal::ZERO {
            RealizationStatus::Full
        } else if realized > Decimal::ZERO {
            RealizationStatus::Partial
        } else {
            RealizationStatus::Pending
        };
        Realization {
            realized,
            pending_amount,
            status,
        }
    }

    /// Past the due date and not fully realized.
    #[must_use]
    pub fn is_overdue(due_date: NaiveDate, status: RealizationStatus, today: NaiveDate) -> bool {
        today > due_date && status != RealizationStatus::Full
    }

    /// Days from `now` until midnight UTC of `due_date`, rounded up.
    #[must_use]
    pub fn days_remaining(due_date: NaiveDate, now: DateTime<Utc>) -> i64 {
        let due = due_date.and_time(chrono::NaiveTime::MIN).and_utc();
        let millis = (due - now).num_milliseconds();
        let days = millis.div_euclid(MILLIS_PER_DAY);
        if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
            days + 1
        } else {
            days
        }
    }

    /// Checks a BRC may be opened against a shipping bill in `status`.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the bill has been filed.
    pub fn ensure_bill_realizable(status: ShippingBillStatus) -> Result<(), WorkflowError> {
        if REALIZABLE_BILL_STATUSES.contains(&status) {
            return Ok(());
        }
        Err(WorkflowError::InvalidState {
            document: DocumentType::ShippingBill,
            action: WorkflowAction::Convert,
            current: status.to_string(),
            attempted: "brc".to_string(),
        })
    }

    /// Buckets BRCs into overdue and upcoming and totals them.
    ///
    /// Upcoming means not overdue, not fully realized, and due within
    /// `window_days`.
    #[must_use]
    pub fn compliance_snapshot(
        brcs: &[BrcSummary],
        now: DateTime<Utc>,
        window_days: u32,
    ) -> ComplianceSnapshot {
        let today = now.date_naive();
        let window = i64::from(window_days);

        let mut snapshot = ComplianceSnapshot {
            total: 0,
            pending: 0,
            partial: 0,
            full: 0,
            overdue: Vec::new(),
            upcoming_due: Vec::new(),
            total_expected: Decimal::ZERO,
            total_realized: Decimal::ZERO,
            total_pending: Decimal::ZERO,
        };

        for brc in brcs {
            snapshot.total += 1;
            match brc.status {
                RealizationStatus::Pending => snapshot.pending += 1,
                RealizationStatus::Partial => snapshot.partial += 1,
                RealizationStatus::Full => snapshot.full += 1,
            }
            snapshot.total_expected += brc.total_expected;
            snapshot.total_pending += brc.pending_amount;
            snapshot.total_realized += brc.total_expected - brc.pending_amount;

            let is_overdue = Self::is_overdue(brc.due_date, brc.status, today);
            let days_remaining = Self::days_remaining(brc.due_date, now);
            let entry = ComplianceEntry {
                id: brc.id,
                brc_number: brc.brc_number.clone(),
                shipping_bill_id: brc.shipping_bill_id,
                due_date: brc.due_date,
                pending_amount: brc.pending_amount,
                currency: brc.currency.clone(),
                status: brc.status,
                days_remaining,
                is_overdue,
            };

            if is_overdue {
                snapshot.overdue.push(entry);
            } else if brc.status != RealizationStatus::Full && days_remaining <= window {
                snapshot.upcoming_due.push(entry);
            }
        }

        snapshot.overdue.sort_by_key(|e| e.due_date);
        snapshot.upcoming_due.sort_by_key(|e| e.due_date);
        snapshot
    }
}

fn cents(amount: Decimal) -> Result<i64, WorkflowError> {
    to_cents(amount).ok_or_else(|| WorkflowError::validation("Amount is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(amount: Decimal) -> PaymentRequest {
        PaymentRequest {
            amount: Some(amount),
            payment_date: Some(date(2025, 5, 1)),
            reference: Some(" SWIFT-123 ".to_string()),
            exchange_rate: None,
        }
    }

    fn summary(due: NaiveDate, status: RealizationStatus, pending: Decimal) -> BrcSummary {
        BrcSummary {
            id: Uuid::new_v4(),
            brc_number: None,
            shipping_bill_id: Uuid::new_v4(),
            total_expected: dec!(1000),
            pending_amount: pending,
            currency: "USD".to_string(),
            due_date: due,
            status,
        }
    }

    #[test]
    fn test_validate_payment_within_pending() {
        let payment = BrcService::validate_payment(&request(dec!(400)), dec!(1000)).unwrap();
        assert_eq!(payment.amount, dec!(400));
        assert_eq!(payment.reference.as_deref(), Some("SWIFT-123"));
        assert_eq!(payment.inr_amount, None);
    }

    #[test]
    fn test_validate_payment_exact_pending_is_allowed() {
        assert!(BrcService::validate_payment(&request(dec!(1000.00)), dec!(1000)).is_ok());
        // sub-cent noise does not count
        assert!(BrcService::validate_payment(&request(dec!(1000.004)), dec!(1000)).is_ok());
    }

    #[test]
    fn test_validate_payment_records_rounded_amount() {
        assert!(matches!(
            BrcService::validate_payment(&request(dec!(0.004)), dec!(100)),
            Err(WorkflowError::Validation(_))
        ));

        let converted = PaymentRequest {
            exchange_rate: Some(dec!(80)),
            ..request(dec!(10.005))
        };
        let payment = BrcService::validate_payment(&converted, dec!(100)).unwrap();
        assert_eq!(payment.amount, dec!(10.01));
        assert_eq!(payment.inr_amount, Some(dec!(800.80)));
    }

    #[test]
    fn test_huge_exchange_rate_is_rejected() {
        let absurd = PaymentRequest {
            exchange_rate: Some(Decimal::MAX),
            ..request(dec!(50))
        };
        assert!(matches!(
            BrcService::validate_payment(&absurd, dec!(100)),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_payment_over_pending() {
        let err = BrcService::validate_payment(&request(dec!(1000.01)), dec!(1000)).unwrap_err();
        assert!(matches!(err, WorkflowError::AmountExceedsPending { .. }));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_validate_payment_missing_fields() {
        let missing_amount = PaymentRequest {
            amount: None,
            ..request(dec!(1))
        };
        assert!(matches!(
            BrcService::validate_payment(&missing_amount, dec!(10)),
            Err(WorkflowError::Validation(_))
        ));

        let missing_date = PaymentRequest {
            payment_date: None,
            ..request(dec!(1))
        };
        assert!(matches!(
            BrcService::validate_payment(&missing_date, dec!(10)),
            Err(WorkflowError::Validation(_))
        ));

        assert!(BrcService::validate_payment(&request(dec!(0)), dec!(10)).is_err());
        assert!(BrcService::validate_payment(&request(dec!(-5)), dec!(10)).is_err());
    }

    #[test]
    fn test_exchange_rate_must_be_positive() {
        let bad_rate = PaymentRequest {
            exchange_rate: Some(dec!(0)),
            ..request(dec!(1))
        };
        assert!(BrcService::validate_payment(&bad_rate, dec!(10)).is_err());

        let good_rate = PaymentRequest {
            exchange_rate: Some(dec!(83.275)),
            ..request(dec!(1500))
        };
        let payment = BrcService::validate_payment(&good_rate, dec!(2000)).unwrap();
        assert_eq!(payment.inr_amount, Some(dec!(124912.50)));
    }

    #[test]
    fn test_realization_status() {
        let none = BrcService::realization(dec!(1000), &[]);
        assert_eq!(none.status, RealizationStatus::Pending);
        assert_eq!(none.pending_amount, dec!(1000));

        let part = BrcService::realization(dec!(1000), &[dec!(300), dec!(200)]);
        assert_eq!(part.status, RealizationStatus::Partial);
        assert_eq!(part.pending_amount, dec!(500));
        assert_eq!(part.realized, dec!(500));

        let full = BrcService::realization(dec!(1000), &[dec!(600), dec!(400)]);
        assert_eq!(full.status, RealizationStatus::Full);
        assert_eq!(full.pending_amount, dec!(0));
    }

    #[test]
    fn test_is_overdue() {
        let due = date(2025, 6, 30);
        assert!(!BrcService::is_overdue(due, RealizationStatus::Partial, due));
        assert!(BrcService::is_overdue(due, RealizationStatus::Partial, date(2025, 7, 1)));
        assert!(!BrcService::is_overdue(due, RealizationStatus::Full, date(2025, 7, 1)));
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(BrcService::days_remaining(date(2025, 6, 2), now), 1);
        assert_eq!(BrcService::days_remaining(date(2025, 6, 11), now), 10);
        assert_eq!(BrcService::days_remaining(date(2025, 6, 1), now), 0);
        assert_eq!(BrcService::days_remaining(date(2025, 5, 30), now), -2);

        let midnight = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(BrcService::days_remaining(date(2025, 6, 3), midnight), 2);
    }

    #[test]
    fn test_overdue_partial_is_not_upcoming() {
        let now = Utc.with_ymd_and_hms(2025, 7, 10, 8, 0, 0).unwrap();
        let overdue = summary(date(2025, 7, 5), RealizationStatus::Partial, dec!(400));
        let snapshot = BrcService::compliance_snapshot(&[overdue.clone()], now, 30);

        assert_eq!(snapshot.overdue.len(), 1);
        assert_eq!(snapshot.overdue[0].id, overdue.id);
        assert!(snapshot.overdue[0].is_overdue);
        assert!(snapshot.upcoming_due.is_empty());
        assert_eq!(snapshot.partial, 1);
    }

    #[test]
    fn test_snapshot_buckets_and_totals() {
        let now = Utc.with_ymd_and_hms(2025, 7, 10, 8, 0, 0).unwrap();
        let later = summary(date(2025, 8, 1), RealizationStatus::Pending, dec!(1000));
        let sooner = summary(date(2025, 7, 20), RealizationStatus::Partial, dec!(250));
        let outside = summary(date(2025, 12, 1), RealizationStatus::Pending, dec!(1000));
        let realized = summary(date(2025, 7, 15), RealizationStatus::Full, dec!(0));
        let old = summary(date(2025, 6, 1), RealizationStatus::Pending, dec!(1000));
        let older = summary(date(2025, 5, 1), RealizationStatus::Pending, dec!(1000));

        let snapshot = BrcService::compliance_snapshot(
            &[later.clone(), sooner.clone(), outside, realized, old.clone(), older.clone()],
            now,
            30,
        );

        assert_eq!(snapshot.total, 6);
        assert_eq!(snapshot.pending, 4);
        assert_eq!(snapshot.partial, 1);
        assert_eq!(snapshot.full, 1);
        let upcoming: Vec<_> = snapshot.upcoming_due.iter().map(|e| e.id).collect();
        assert_eq!(upcoming, vec![sooner.id, later.id]);
        let overdue: Vec<_> = snapshot.overdue.iter().map(|e| e.id).collect();
        assert_eq!(overdue, vec![older.id, old.id]);
        assert_eq!(snapshot.total_expected, dec!(6000));
        assert_eq!(snapshot.total_pending, dec!(4250));
        assert_eq!(snapshot.total_realized, dec!(1750));
    }

    #[test]
    fn test_brc_needs_filed_bill() {
        assert!(BrcService::ensure_bill_realizable(ShippingBillStatus::Filed).is_ok());
        assert!(BrcService::ensure_bill_realizable(ShippingBillStatus::Drafted).is_err());
    }
}
