//! Document numbering rules.
//!
//! Numbers look like `PI-2025-007`: prefix, calendar year, and a sequence
//! zero-padded to at least three digits. Sequences are scoped to
//! (company, document type, year) and only ever move forward.
//!
//! Allocation itself is a storage concern; this module owns the format and the
//! arithmetic the allocator must respect.

use serde::Serialize;
use std::fmt;

use crate::workflow::types::DocumentType;

#[cfg(test)]
mod props;

/// A parsed document number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentNumber {
    /// Document type, from the prefix.
    pub document: DocumentType,
    /// Calendar year.
    pub year: i32,
    /// Sequence within (company, type, year), starting at 1.
    pub sequence: u64,
}

impl DocumentNumber {
    /// Creates a document number.
    #[must_use]
    pub const fn new(document: DocumentType, year: i32, sequence: u64) -> Self {
        Self {
            document,
            year,
            sequence,
        }
    }

    /// Parses `{PREFIX}-{YEAR}-{SEQ}`. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('-');
        let prefix = parts.next()?;
        let year = parts.next()?;
        let sequence = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            document: DocumentType::from_prefix(prefix)?,
            year: year.parse().ok()?,
            sequence: sequence.parse().ok()?,
        })
    }

    /// The number that follows this one in the same scope.
    #[must_use]
    pub const fn successor(self) -> Self {
        Self {
            sequence: self.sequence + 1,
            ..self
        }
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:03}",
            self.document.prefix(),
            self.year,
            self.sequence
        )
    }
}

/// Formats a number without constructing a `DocumentNumber`.
#[must_use]
pub fn format_number(document: DocumentType, year: i32, sequence: u64) -> String {
    DocumentNumber::new(document, year, sequence).to_string()
}

/// SQL `LIKE` pattern matching every number of a scope.
#[must_use]
pub fn scope_pattern(document: DocumentType, year: i32) -> String {
    format!("{}-{}-%", document.prefix(), year)
}

/// Sequence of the most recent existing number in the scope, or 0.
///
/// Numbers from another type or year, or that do not parse, count as 0.
#[must_use]
pub fn legacy_floor(document: DocumentType, year: i32, latest: Option<&str>) -> u64 {
    latest
        .and_then(DocumentNumber::parse)
        .filter(|n| n.document == document && n.year == year)
        .map_or(0, |n| n.sequence)
}

/// Next sequence given the stored counter and the legacy floor.
///
/// Mirrors the storage upsert: `GREATEST(last_value, floor) + 1`, or
/// `floor + 1` when no counter exists yet.
#[must_use]
pub fn next_sequence(counter: Option<u64>, floor: u64) -> u64 {
    counter.map_or(floor, |c| c.max(floor)) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_number(DocumentType::Quote, 2025, 1), "QT-2025-001");
        assert_eq!(format_number(DocumentType::Quote, 2025, 2), "QT-2025-002");
        assert_eq!(
            format_number(DocumentType::ProformaInvoice, 2025, 42),
            "PI-2025-042"
        );
    }

    #[test]
    fn test_format_keeps_all_digits_past_999() {
        assert_eq!(
            format_number(DocumentType::ShippingBill, 2026, 1000),
            "SB-2026-1000"
        );
        assert_eq!(
            format_number(DocumentType::Enquiry, 2026, 123_456),
            "ENQ-2026-123456"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            DocumentNumber::parse("EO-2024-017"),
            Some(DocumentNumber::new(DocumentType::ExportOrder, 2024, 17))
        );
        assert_eq!(DocumentNumber::parse("EO-2024-"), None);
        assert_eq!(DocumentNumber::parse("XX-2024-001"), None);
        assert_eq!(DocumentNumber::parse("EO-24-001"), None);
        assert_eq!(DocumentNumber::parse("EO-2024-001-A"), None);
        assert_eq!(DocumentNumber::parse("EO-2024-00a"), None);
    }

    #[test]
    fn test_legacy_floor() {
        let doc = DocumentType::Quote;
        assert_eq!(legacy_floor(doc, 2025, None), 0);
        assert_eq!(legacy_floor(doc, 2025, Some("QT-2025-041")), 41);
        assert_eq!(legacy_floor(doc, 2025, Some("QT-2024-900")), 0);
        assert_eq!(legacy_floor(doc, 2025, Some("PI-2025-900")), 0);
        assert_eq!(legacy_floor(doc, 2025, Some("garbage")), 0);
    }

    #[test]
    fn test_next_sequence() {
        assert_eq!(next_sequence(None, 0), 1);
        assert_eq!(next_sequence(None, 41), 42);
        assert_eq!(next_sequence(Some(5), 3), 6);
        assert_eq!(next_sequence(Some(5), 9), 10);
    }

    #[test]
    fn test_scope_pattern() {
        assert_eq!(
            scope_pattern(DocumentType::PurchaseOrder, 2025),
            "PO-2025-%"
        );
    }

    #[test]
    fn test_successor() {
        let n = DocumentNumber::new(DocumentType::Enquiry, 2025, 999);
        assert_eq!(n.successor().to_string(), "ENQ-2025-1000");
    }
}
