//! Shipment quantities against export order lines.
//!
//! Remaining quantity of an order line is its ordered quantity minus what all
//! shipments so far have taken. Only lines with something left are offered.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{DocumentType, ExportOrderStatus, WorkflowAction};

/// Order statuses that accept new shipments.
pub const SHIPPABLE_ORDER_STATUSES: &[ExportOrderStatus] = &[
    ExportOrderStatus::Approved,
    ExportOrderStatus::Confirmed,
    ExportOrderStatus::InProduction,
    ExportOrderStatus::Ready,
];

/// An export order line as far as shipping is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Order item ID.
    pub order_item_id: Uuid,
    /// Description.
    pub description: String,
    /// Unit of measure.
    pub unit: String,
    /// Ordered quantity.
    pub quantity: Decimal,
}

/// A line that can still be shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippableItem {
    /// Order item ID.
    pub order_item_id: Uuid,
    /// Description.
    pub description: String,
    /// Unit of measure.
    pub unit: String,
    /// Ordered quantity.
    pub ordered: Decimal,
    /// Already shipped across all shipments.
    pub shipped: Decimal,
    /// Still to ship.
    pub remaining: Decimal,
}

/// One requested shipment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    /// Order item ID.
    pub order_item_id: Uuid,
    /// Quantity to ship.
    pub quantity: Decimal,
}

/// Computes remaining quantities.
///
/// `shipped` holds one entry per existing shipment item; entries for the
/// same order item are summed.
#[must_use]
pub fn shippable_items(lines: &[OrderLine], shipped: &[(Uuid, Decimal)]) -> Vec<ShippableItem> {
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for (item_id, quantity) in shipped {
        *totals.entry(*item_id).or_default() += *quantity;
    }

    lines
        .iter()
        .filter_map(|line| {
            let done = totals.get(&line.order_item_id).copied().unwrap_or_default();
            let remaining = line.quantity - done;
            (remaining > Decimal::ZERO).then(|| ShippableItem {
                order_item_id: line.order_item_id,
                description: line.description.clone(),
                unit: line.unit.clone(),
                ordered: line.quantity,
                shipped: done,
                remaining,
            })
        })
        .collect()
}

/// Checks the order accepts shipments.
///
/// # Errors
///
/// `InvalidState` unless the order is between approved and ready.
pub fn ensure_order_shippable(status: ExportOrderStatus) -> Result<(), WorkflowError> {
    if SHIPPABLE_ORDER_STATUSES.contains(&status) {
        return Ok(());
    }
    Err(WorkflowError::InvalidState {
        document: DocumentType::ExportOrder,
        action: WorkflowAction::Convert,
        current: status.to_string(),
        attempted: "shipment".to_string(),
    })
}

/// Validates requested lines against what is still shippable.
///
/// Lines naming the same order item are summed before the check.
///
/// # Errors
///
/// `Validation` if the request is empty, a quantity is not positive, an item
/// is unknown or fully shipped, or a quantity exceeds what remains.
pub fn validate_shipment(
    requested: &[ShipmentLine],
    available: &[ShippableItem],
) -> Result<(), WorkflowError> {
    if requested.is_empty() {
        return Err(WorkflowError::validation("A shipment needs at least one item"));
    }

    let mut wanted: HashMap<Uuid, Decimal> = HashMap::new();
    for line in requested {
        if line.quantity <= Decimal::ZERO {
            return Err(WorkflowError::validation(format!(
                "Quantity for item {} must be positive",
                line.order_item_id
            )));
        }
        *wanted.entry(line.order_item_id).or_default() += line.quantity;
    }

    for (item_id, quantity) in wanted {
        let item = available
            .iter()
            .find(|i| i.order_item_id == item_id)
            .ok_or_else(|| {
                WorkflowError::validation(format!("Item {item_id} has nothing left to ship"))
            })?;
        if quantity > item.remaining {
            return Err(WorkflowError::validation(format!(
                "Quantity {quantity} for item {item_id} exceeds remaining {}",
                item.remaining
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order_line(id: Uuid, quantity: Decimal) -> OrderLine {
        OrderLine {
            order_item_id: id,
            description: "Steel flanges".to_string(),
            unit: "pcs".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_remaining_is_ordered_minus_all_shipments() {
        let id = Uuid::new_v4();
        let items = shippable_items(&[order_line(id, dec!(100))], &[(id, dec!(30)), (id, dec!(20))]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].shipped, dec!(50));
        assert_eq!(items[0].remaining, dec!(50));
    }

    #[test]
    fn test_fully_shipped_items_are_excluded() {
        let done = Uuid::new_v4();
        let open = Uuid::new_v4();
        let items = shippable_items(
            &[order_line(done, dec!(10)), order_line(open, dec!(5))],
            &[(done, dec!(10))],
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order_item_id, open);
        assert_eq!(items[0].remaining, dec!(5));
    }

    #[test]
    fn test_validate_shipment() {
        let id = Uuid::new_v4();
        let available = shippable_items(&[order_line(id, dec!(100))], &[(id, dec!(60))]);

        let ok = [ShipmentLine {
            order_item_id: id,
            quantity: dec!(40),
        }];
        assert!(validate_shipment(&ok, &available).is_ok());

        let too_much = [ShipmentLine {
            order_item_id: id,
            quantity: dec!(40.001),
        }];
        assert!(validate_shipment(&too_much, &available).is_err());

        let split_too_much = [
            ShipmentLine {
                order_item_id: id,
                quantity: dec!(25),
            },
            ShipmentLine {
                order_item_id: id,
                quantity: dec!(25),
            },
        ];
        assert!(validate_shipment(&split_too_much, &available).is_err());

        let zero = [ShipmentLine {
            order_item_id: id,
            quantity: dec!(0),
        }];
        assert!(validate_shipment(&zero, &available).is_err());

        let unknown = [ShipmentLine {
            order_item_id: Uuid::new_v4(),
            quantity: dec!(1),
        }];
        assert!(validate_shipment(&unknown, &available).is_err());
        assert!(validate_shipment(&[], &available).is_err());
    }

    #[test]
    fn test_order_must_be_approved_to_ship() {
        assert!(ensure_order_shippable(ExportOrderStatus::Ready).is_ok());
        assert!(ensure_order_shippable(ExportOrderStatus::Pending).is_err());
        assert!(ensure_order_shippable(ExportOrderStatus::Shipped).is_err());
    }
}
