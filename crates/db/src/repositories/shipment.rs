//! Shipment repository.
//!
//! A shipment takes quantities from export order lines. Creation locks the
//! order row first, so two shipments against the same order are serialized
//! and cannot together exceed what was ordered.

use chrono::{NaiveDate, Utc};
use eximflow_core::WorkflowError;
use eximflow_core::shipment::{
    OrderLine, ShipmentLine, ShippableItem, ensure_order_shippable, shippable_items,
    validate_shipment,
};
use eximflow_core::workflow::{ExportOrderStatus, ShipmentStatus};
use eximflow_shared::types::{CompanyId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{shipment_items, shipments};

use super::export_order::{find_order, load_order_items};
use super::shipping_bill::find_bill;
use super::support::{begin_scoped, db_err, non_blank, stored_status, timestamp};

/// Input for creating a shipment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShipmentInput {
    /// Shipping bill covering the shipment; must belong to the same order.
    #[serde(default)]
    pub shipping_bill_id: Option<Uuid>,
    /// Shipment date; defaults to today.
    #[serde(default)]
    pub shipment_date: Option<NaiveDate>,
    /// Incoterm (FOB, CIF, ...).
    #[serde(default)]
    pub incoterm: Option<String>,
    /// Carrier name.
    #[serde(default)]
    pub carrier: Option<String>,
    /// Quantities to ship.
    pub items: Vec<ShipmentLine>,
}

/// A shipment with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentDetail {
    /// The shipment row.
    #[serde(flatten)]
    pub shipment: shipments::Model,
    /// Shipped quantities.
    pub items: Vec<shipment_items::Model>,
}

/// Remaining quantities of `order_id` as seen through `conn`.
async fn remaining<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> Result<Vec<ShippableItem>, WorkflowError> {
    let lines: Vec<OrderLine> = load_order_items(conn, order_id)
        .await?
        .into_iter()
        .map(|item| OrderLine {
            order_item_id: item.id,
            description: item.description,
            unit: item.unit,
            quantity: item.quantity,
        })
        .collect();
    let ids: Vec<Uuid> = lines.iter().map(|l| l.order_item_id).collect();

    let shipped: Vec<(Uuid, Decimal)> = shipment_items::Entity::find()
        .filter(shipment_items::Column::ExportOrderItemId.is_in(ids))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|s| (s.export_order_item_id, s.quantity))
        .collect();

    Ok(shippable_items(&lines, &shipped))
}

/// Shipment repository.
#[derive(Debug, Clone)]
pub struct ShipmentRepository {
    db: DatabaseConnection,
}

impl ShipmentRepository {
    /// Creates a new shipment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Order lines that still have quantity left to ship.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order does not exist in the company.
    pub async fn shippable_items(
        &self,
        company_id: CompanyId,
        order_id: Uuid,
    ) -> Result<Vec<ShippableItem>, WorkflowError> {
        find_order(&self.db, company_id, order_id, false).await?;
        remaining(&self.db, order_id).await
    }

    /// Creates a planned shipment against an export order.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the order or the named shipping bill does not exist.
    /// * `InvalidState` unless the order is between approved and ready.
    /// * `Validation` if a quantity is not positive or exceeds what remains,
    ///   or the shipping bill belongs to another order.
    pub async fn create(
        &self,
        company_id: CompanyId,
        order_id: Uuid,
        actor: UserId,
        input: CreateShipmentInput,
    ) -> Result<ShipmentDetail, WorkflowError> {
        let txn = begin_scoped(&self.db, company_id).await?;
        let order = find_order(&txn, company_id, order_id, true).await?;
        let status: ExportOrderStatus = stored_status(&order.status)?;
        ensure_order_shippable(status)?;

        if let Some(bill_id) = input.shipping_bill_id {
            let bill = find_bill(&txn, company_id, bill_id, false).await?;
            if bill.export_order_id != order_id {
                return Err(WorkflowError::validation(format!(
                    "Shipping bill {} belongs to another export order",
                    bill.sb_number
                )));
            }
        }

        let available = remaining(&txn, order_id).await?;
        validate_shipment(&input.items, &available)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let shipment = shipments::ActiveModel {
            id: Set(id),
            company_id: Set(company_id.into_inner()),
            export_order_id: Set(order_id),
            shipping_bill_id: Set(input.shipping_bill_id),
            status: Set(ShipmentStatus::Planned.as_str().to_string()),
            shipment_date: Set(input.shipment_date.unwrap_or_else(|| now.date_naive())),
            incoterm: Set(non_blank(input.incoterm).map(|i| i.to_uppercase())),
            carrier: Set(non_blank(input.carrier)),
            created_by: Set(actor.into_inner()),
            created_at: Set(timestamp(now)),
            updated_at: Set(timestamp(now)),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let item = shipment_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                shipment_id: Set(id),
                export_order_item_id: Set(line.order_item_id),
                quantity: Set(line.quantity),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            items.push(item);
        }

        txn.commit().await.map_err(db_err)?;
        tracing::info!(
            company_id = %company_id,
            order_id = %order_id,
            shipment_id = %id,
            lines = items.len(),
            "Shipment created"
        );
        Ok(ShipmentDetail { shipment, items })
    }

    /// Shipments of an order, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order does not exist in the company.
    pub async fn list_for_order(
        &self,
        company_id: CompanyId,
        order_id: Uuid,
    ) -> Result<Vec<ShipmentDetail>, WorkflowError> {
        find_order(&self.db, company_id, order_id, false).await?;
        let rows = shipments::Entity::find()
            .filter(shipments::Column::CompanyId.eq(company_id.into_inner()))
            .filter(shipments::Column::ExportOrderId.eq(order_id))
            .order_by_asc(shipments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
        let mut items = shipment_items::Entity::find()
            .filter(shipment_items::Column::ShipmentId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|shipment| {
                let (mine, rest): (Vec<_>, Vec<_>) =
                    items.drain(..).partition(|i| i.shipment_id == shipment.id);
                items = rest;
                ShipmentDetail {
                    shipment,
                    items: mine,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_input_requires_items() {
        let err = serde_json::from_str::<CreateShipmentInput>(r#"{"carrier": "Maersk"}"#);
        assert!(err.is_err());

        let item = Uuid::new_v4();
        let input: CreateShipmentInput = serde_json::from_str(&format!(
            r#"{{"incoterm": "fob", "items": [{{"order_item_id": "{item}", "quantity": "30"}}]}}"#
        ))
        .unwrap();
        assert_eq!(input.items[0].quantity, dec!(30));
        assert!(input.shipping_bill_id.is_none());
    }
}
