//! Property-based tests for BRC realization.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::brc::service::BrcService;
use crate::brc::types::PaymentRequest;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::RealizationStatus;

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn payment(amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        amount: Some(amount),
        payment_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 15),
        reference: None,
        exchange_rate: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Applying any sequence of attempted payments through validation keeps
    /// the realized sum within the total, and pending equals total minus sum.
    #[test]
    fn prop_payments_never_exceed_total(
        total in positive_amount(),
        attempts in prop::collection::vec(positive_amount(), 1..20),
    ) {
        let mut accepted: Vec<Decimal> = Vec::new();
        for amount in attempts {
            let pending = BrcService::realization(total, &accepted).pending_amount;
            match BrcService::validate_payment(&payment(amount), pending) {
                Ok(p) => accepted.push(p.amount),
                Err(err) => {
                    let is_exceeds = matches!(err, WorkflowError::AmountExceedsPending { .. });
                    prop_assert!(is_exceeds);
                }
            }
        }

        let realization = BrcService::realization(total, &accepted);
        let sum: Decimal = accepted.iter().copied().sum();
        prop_assert!(sum <= total);
        prop_assert_eq!(realization.pending_amount, total - sum);
        prop_assert_eq!(realization.realized, sum);
    }

    /// Status follows the pending amount.
    #[test]
    fn prop_status_matches_pending(
        total in positive_amount(),
        paid_fraction in 0u32..=100,
    ) {
        let paid = (total * Decimal::from(paid_fraction) / Decimal::ONE_HUNDRED).round_dp(2);
        let payments = if paid.is_zero() { vec![] } else { vec![paid] };
        let realization = BrcService::realization(total, &payments);
        let expected = if realization.pending_amount <= Decimal::ZERO {
            RealizationStatus::Full
        } else if paid > Decimal::ZERO {
            RealizationStatus::Partial
        } else {
            RealizationStatus::Pending
        };
        prop_assert_eq!(realization.status, expected);
    }
}
