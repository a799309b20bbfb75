//! Line and document pricing.
//!
//! `line_total = quantity * unit_price * (1 - discount/100) * (1 + tax/100)`,
//! rounded to 2 places half away from zero. Document totals are the sum of
//! rounded line totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eximflow_shared::types::round_money;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::PaymentStatus;

/// Places kept for stored quantities.
pub const QUANTITY_SCALE: u32 = 3;
/// Places kept for entered prices and percentages.
pub const PRICE_SCALE: u32 = 2;

const MAX_QUANTITY: i64 = 1_000_000_000_000_000;
/// Exclusive upper bound of a stored money amount.
pub const MAX_AMOUNT: i64 = 10_000_000_000_000_000;
const MAX_TAX_PERCENT: i64 = 1_000;

fn fits_scale(value: Decimal, scale: u32) -> bool {
    value.normalize().scale() <= scale
}

/// Computes a rounded line total.
///
/// # Errors
///
/// Returns `WorkflowError::Validation` if the arithmetic overflows or the
/// total does not fit a stored amount.
pub fn line_total(
    quantity: Decimal,
    unit_price: Decimal,
    discount_percent: Decimal,
    tax_percent: Decimal,
) -> Result<Decimal, WorkflowError> {
    let hundred = Decimal::ONE_HUNDRED;
    quantity
        .checked_mul(unit_price)
        .and_then(|gross| gross.checked_mul(hundred.checked_sub(discount_percent)?))
        .and_then(|net| net.checked_div(hundred))
        .and_then(|net| net.checked_mul(hundred.checked_add(tax_percent)?))
        .and_then(|taxed| taxed.checked_div(hundred))
        .map(round_money)
        .filter(|total| total.abs() < Decimal::from(MAX_AMOUNT))
        .ok_or_else(|| WorkflowError::validation("Line total is out of range"))
}

/// Sums line totals.
///
/// # Errors
///
/// Returns `WorkflowError::Validation` if a line total or the sum is out of range.
pub fn document_total(lines: &[LineItem]) -> Result<Decimal, WorkflowError> {
    let mut total = Decimal::ZERO;
    for line in lines {
        total = total
            .checked_add(line.line_total()?)
            .filter(|sum| sum.abs() < Decimal::from(MAX_AMOUNT))
            .ok_or_else(|| WorkflowError::validation("Document total is out of range"))?;
    }
    Ok(total)
}

/// Rounds a payment to cents and checks it is positive and storable.
///
/// # Errors
///
/// Returns `WorkflowError::Validation` if the rounded amount is not positive
/// or is too large.
pub fn payment_amount(amount: Decimal) -> Result<Decimal, WorkflowError> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO {
        return Err(WorkflowError::validation("Payment amount must be positive"));
    }
    if rounded >= Decimal::from(MAX_AMOUNT) {
        return Err(WorkflowError::validation("Payment amount is too large"));
    }
    Ok(rounded)
}

/// Derives purchase order payment status from what has been paid.
#[must_use]
pub fn payment_status(total: Decimal, paid: Decimal) -> PaymentStatus {
    if paid > Decimal::ZERO && paid >= total {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    }
}

/// A priced document line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalogue reference.
    #[serde(default)]
    pub sku_id: Option<Uuid>,
    /// Description.
    pub description: String,
    /// HSN tariff code.
    #[serde(default)]
    pub hsn_code: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit of measure.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Discount percentage.
    #[serde(default)]
    pub discount_percent: Decimal,
    /// Tax percentage.
    #[serde(default)]
    pub tax_percent: Decimal,
    /// Net weight (kg).
    #[serde(default)]
    pub net_weight: Option<Decimal>,
    /// Gross weight (kg).
    #[serde(default)]
    pub gross_weight: Option<Decimal>,
}

fn default_unit() -> String {
    "pcs".to_string()
}

impl LineItem {
    /// Rounded line total.
    ///
    /// # Errors
    ///
    /// See [`line_total`].
    pub fn line_total(&self) -> Result<Decimal, WorkflowError> {
        line_total(
            self.quantity,
            self.unit_price,
            self.discount_percent,
            self.tax_percent,
        )
    }

    /// Checks quantities, prices and percentages against what storage holds:
    /// quantities to 3 places, prices and percentages to 2.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.description.trim().is_empty() {
            return Err(WorkflowError::validation("Line description is required"));
        }
        validate_quantity(self.quantity)?;
        validate_price(self.unit_price, "Unit price")?;
        if self.discount_percent < Decimal::ZERO || self.discount_percent > Decimal::ONE_HUNDRED {
            return Err(WorkflowError::validation(
                "Discount must be between 0 and 100 percent",
            ));
        }
        if !fits_scale(self.discount_percent, PRICE_SCALE) {
            return Err(WorkflowError::validation(
                "Discount cannot have more than 2 decimal places",
            ));
        }
        if self.tax_percent < Decimal::ZERO || self.tax_percent >= Decimal::from(MAX_TAX_PERCENT) {
            return Err(WorkflowError::validation(
                "Tax must be between 0 and 999.99 percent",
            ));
        }
        if !fits_scale(self.tax_percent, PRICE_SCALE) {
            return Err(WorkflowError::validation(
                "Tax cannot have more than 2 decimal places",
            ));
        }
        Ok(())
    }

    /// Builds a quote line from an enquiry line: expected price becomes the
    /// unit price, no discount, no tax.
    #[must_use]
    pub fn from_enquiry(line: &EnquiryLine) -> Self {
        Self {
            sku_id: line.product_id,
            description: line.description.clone(),
            hsn_code: None,
            quantity: line.quantity,
            unit: line.unit.clone(),
            unit_price: line.expected_price.unwrap_or(Decimal::ZERO),
            discount_percent: Decimal::ZERO,
            tax_percent: Decimal::ZERO,
            net_weight: None,
            gross_weight: None,
        }
    }

    /// Folds the discount into the unit price, keeping tax.
    ///
    /// Used when a quote line becomes a proforma or order line, which has no
    /// discount column. The folded price is not rounded: a 2-place price with
    /// a 2-place discount is exact at 6 places, which is what those tables
    /// store, so the line total is unchanged.
    #[must_use]
    pub fn with_discount_applied(&self) -> Self {
        let hundred = Decimal::ONE_HUNDRED;
        let folded = hundred
            .checked_sub(self.discount_percent)
            .and_then(|kept| self.unit_price.checked_mul(kept))
            .and_then(|price| price.checked_div(hundred))
            .map_or(self.unit_price, |price| price.normalize());
        Self {
            unit_price: folded,
            discount_percent: Decimal::ZERO,
            ..self.clone()
        }
    }
}

/// Validates every line and returns the document total.
///
/// # Errors
///
/// Returns `WorkflowError::Validation` if there are no lines or a line is invalid.
pub fn price_lines(lines: &[LineItem]) -> Result<Decimal, WorkflowError> {
    if lines.is_empty() {
        return Err(WorkflowError::validation("At least one line item is required"));
    }
    for line in lines {
        line.validate()?;
    }
    document_total(lines)
}

fn validate_quantity(quantity: Decimal) -> Result<(), WorkflowError> {
    if quantity <= Decimal::ZERO {
        return Err(WorkflowError::validation("Line quantity must be positive"));
    }
    if quantity >= Decimal::from(MAX_QUANTITY) {
        return Err(WorkflowError::validation("Line quantity is too large"));
    }
    if !fits_scale(quantity, QUANTITY_SCALE) {
        return Err(WorkflowError::validation(
            "Line quantity cannot have more than 3 decimal places",
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal, field: &str) -> Result<(), WorkflowError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(WorkflowError::validation(format!("{field} cannot be negative")));
    }
    if price >= Decimal::from(MAX_AMOUNT) {
        return Err(WorkflowError::validation(format!("{field} is too large")));
    }
    if !fits_scale(price, PRICE_SCALE) {
        return Err(WorkflowError::validation(format!(
            "{field} cannot have more than 2 decimal places"
        )));
    }
    Ok(())
}

/// An enquiry line: what the customer asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryLine {
    /// Catalogue reference.
    #[serde(default)]
    pub product_id: Option<Uuid>,
    /// Description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit of measure.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Price the customer expects, if stated.
    #[serde(default)]
    pub expected_price: Option<Decimal>,
}

impl EnquiryLine {
    /// Same storage limits as a priced line.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.description.trim().is_empty() {
            return Err(WorkflowError::validation("Line description is required"));
        }
        validate_quantity(self.quantity)?;
        if let Some(price) = self.expected_price {
            validate_price(price, "Expected price")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal, unit_price: Decimal, discount: Decimal, tax: Decimal) -> LineItem {
        LineItem {
            sku_id: None,
            description: "Cotton yarn".to_string(),
            hsn_code: Some("5205".to_string()),
            quantity,
            unit: "kg".to_string(),
            unit_price,
            discount_percent: discount,
            tax_percent: tax,
            net_weight: None,
            gross_weight: None,
        }
    }

    #[test]
    fn test_quote_line_with_discount_and_tax() {
        assert_eq!(
            line_total(dec!(10), dec!(100), dec!(10), dec!(18)).unwrap(),
            dec!(1062.00)
        );
    }

    #[rstest]
    #[case(dec!(1), dec!(0.005), dec!(0), dec!(0), dec!(0.01))]
    #[case(dec!(3), dec!(33.333), dec!(0), dec!(0), dec!(100.00))]
    #[case(dec!(2.5), dec!(40), dec!(100), dec!(18), dec!(0.00))]
    #[case(dec!(7), dec!(12.5), dec!(0), dec!(5), dec!(91.88))]
    fn test_line_total_rounding(
        #[case] qty: Decimal,
        #[case] price: Decimal,
        #[case] discount: Decimal,
        #[case] tax: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(line_total(qty, price, discount, tax).unwrap(), expected);
    }

    #[test]
    fn test_document_total() {
        let lines = vec![
            line(dec!(10), dec!(100), dec!(10), dec!(18)),
            line(dec!(1), dec!(50), dec!(0), dec!(0)),
        ];
        assert_eq!(price_lines(&lines).unwrap(), dec!(1112.00));
    }

    #[test]
    fn test_price_lines_rejects_empty_and_invalid() {
        assert!(price_lines(&[]).is_err());
        assert!(price_lines(&[line(dec!(0), dec!(1), dec!(0), dec!(0))]).is_err());
        assert!(price_lines(&[line(dec!(1), dec!(1), dec!(101), dec!(0))]).is_err());
        assert!(price_lines(&[line(dec!(1), dec!(-1), dec!(0), dec!(0))]).is_err());
    }

    #[rstest]
    #[case(dec!(100), dec!(0), PaymentStatus::Unpaid)]
    #[case(dec!(100), dec!(40), PaymentStatus::Partial)]
    #[case(dec!(100), dec!(100), PaymentStatus::Paid)]
    #[case(dec!(100), dec!(120), PaymentStatus::Paid)]
    fn test_payment_status(
        #[case] total: Decimal,
        #[case] paid: Decimal,
        #[case] expected: PaymentStatus,
    ) {
        assert_eq!(payment_status(total, paid), expected);
    }

    #[rstest]
    #[case(dec!(0.004))]
    #[case(dec!(0))]
    #[case(dec!(-5))]
    #[case(dec!(10000000000000000))]
    fn test_payment_amount_rejects(#[case] amount: Decimal) {
        assert!(matches!(
            payment_amount(amount),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_payment_amount_rounds_to_cents() {
        assert_eq!(payment_amount(dec!(0.005)).unwrap(), dec!(0.01));
        assert_eq!(payment_amount(dec!(125.499)).unwrap(), dec!(125.50));
    }

    #[test]
    fn test_from_enquiry_uses_expected_price() {
        let enquiry = EnquiryLine {
            product_id: None,
            description: "Basmati rice".to_string(),
            quantity: dec!(500),
            unit: "kg".to_string(),
            expected_price: Some(dec!(1.2)),
        };
        let quoted = LineItem::from_enquiry(&enquiry);
        assert_eq!(quoted.unit_price, dec!(1.2));
        assert_eq!(quoted.line_total().unwrap(), dec!(600.00));

        let unpriced = LineItem::from_enquiry(&EnquiryLine {
            expected_price: None,
            ..enquiry
        });
        assert_eq!(unpriced.line_total().unwrap(), dec!(0.00));
    }

    #[test]
    fn test_discount_applied_keeps_total() {
        let quoted = line(dec!(10), dec!(100), dec!(10), dec!(18));
        let invoiced = quoted.with_discount_applied();
        assert_eq!(invoiced.unit_price, dec!(90));
        assert_eq!(invoiced.discount_percent, Decimal::ZERO);
        assert_eq!(invoiced.tax_percent, dec!(18));
        assert_eq!(invoiced.line_total().unwrap(), quoted.line_total().unwrap());
    }

    #[test]
    fn test_sub_cent_folded_price_keeps_total() {
        let quoted = line(dec!(1000), dec!(0.15), dec!(3), dec!(0));
        let invoiced = quoted.with_discount_applied();
        assert_eq!(invoiced.unit_price, dec!(0.1455));
        assert_eq!(quoted.line_total().unwrap(), dec!(145.50));
        assert_eq!(invoiced.line_total().unwrap(), dec!(145.50));
    }

    proptest! {
        #[test]
        fn prop_folding_never_changes_the_total(
            qty_milli in 1_i64..10_000_000,
            price_cents in 0_i64..10_000_000,
            discount_bp in 0_i64..=10_000,
            tax_bp in 0_i64..5_000,
        ) {
            let quoted = line(
                Decimal::new(qty_milli, 3),
                Decimal::new(price_cents, 2),
                Decimal::new(discount_bp, 2),
                Decimal::new(tax_bp, 2),
            );
            let folded = quoted.with_discount_applied();
            prop_assert!(folded.unit_price.normalize().scale() <= 6);
            prop_assert_eq!(folded.line_total().unwrap(), quoted.line_total().unwrap());
        }
    }

    #[rstest]
    #[case(dec!(1000), dec!(0.015))]
    #[case(dec!(1.0005), dec!(10))]
    #[case(dec!(1000000000000000), dec!(1))]
    #[case(dec!(1), dec!(10000000000000000))]
    fn test_validate_rejects_values_storage_cannot_hold(
        #[case] qty: Decimal,
        #[case] price: Decimal,
    ) {
        assert!(matches!(
            line(qty, price, dec!(0), dec!(0)).validate(),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_trailing_zeros() {
        assert!(line(dec!(2.5000), dec!(1.500), dec!(5.00), dec!(18.0)).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_fractional_percent_places() {
        assert!(line(dec!(1), dec!(1), dec!(2.555), dec!(0)).validate().is_err());
        assert!(line(dec!(1), dec!(1), dec!(0), dec!(18.125)).validate().is_err());
        assert!(line(dec!(1), dec!(1), dec!(0), dec!(1000)).validate().is_err());
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        assert!(matches!(
            line_total(Decimal::MAX, dec!(2), dec!(0), dec!(0)),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            price_lines(&[line(Decimal::MAX, Decimal::MAX, dec!(0), dec!(0))]),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_line_total_beyond_stored_amount_is_rejected() {
        let huge = line(dec!(999999999999), dec!(99999), dec!(0), dec!(0));
        assert!(matches!(huge.line_total(), Err(WorkflowError::Validation(_))));
        assert!(matches!(price_lines(&[huge]), Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_enquiry_line_limits() {
        let enquiry = EnquiryLine {
            product_id: None,
            description: "Jute bags".to_string(),
            quantity: dec!(100),
            unit: "pcs".to_string(),
            expected_price: Some(dec!(0.015)),
        };
        assert!(enquiry.validate().is_err());
        let priced = EnquiryLine {
            expected_price: Some(dec!(0.02)),
            ..enquiry.clone()
        };
        assert!(priced.validate().is_ok());
        let fractional = EnquiryLine {
            quantity: dec!(0.0001),
            ..priced
        };
        assert!(fractional.validate().is_err());
    }
}
