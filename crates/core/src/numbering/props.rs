//! Property-based tests for document numbering.

use proptest::prelude::*;

use super::{DocumentNumber, format_number, legacy_floor, next_sequence};
use crate::workflow::types::DocumentType;

fn arb_document() -> impl Strategy<Value = DocumentType> {
    proptest::sample::select(DocumentType::ALL)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Formatting then parsing recovers type, year and sequence.
    #[test]
    fn prop_format_parse_identity(
        document in arb_document(),
        year in 2000i32..2100,
        sequence in 1u64..10_000_000,
    ) {
        let text = format_number(document, year, sequence);
        prop_assert_eq!(
            DocumentNumber::parse(&text),
            Some(DocumentNumber::new(document, year, sequence))
        );
    }

    /// A run of allocations yields strictly increasing sequences whose
    /// formatted numbers are distinct.
    #[test]
    fn prop_allocations_strictly_increase(
        document in arb_document(),
        floor in 0u64..5_000,
        count in 1usize..50,
    ) {
        let mut counter: Option<u64> = None;
        let mut issued = Vec::new();
        for _ in 0..count {
            let next = next_sequence(counter, floor);
            counter = Some(next);
            issued.push(format_number(document, 2025, next));
        }
        for pair in issued.windows(2) {
            let a = DocumentNumber::parse(&pair[0]).unwrap();
            let b = DocumentNumber::parse(&pair[1]).unwrap();
            prop_assert_eq!(b.sequence, a.sequence + 1);
        }
        let first = DocumentNumber::parse(&issued[0]).unwrap();
        prop_assert_eq!(first.sequence, floor + 1);
    }

    /// The next number never collides with an existing legacy number.
    #[test]
    fn prop_next_exceeds_legacy(
        document in arb_document(),
        legacy in 1u64..100_000,
        counter in proptest::option::of(0u64..100_000),
    ) {
        let latest = format_number(document, 2025, legacy);
        let floor = legacy_floor(document, 2025, Some(&latest));
        prop_assert!(next_sequence(counter, floor) > legacy);
    }
}
