//! Workflow event sink.
//!
//! Repositories publish an event after each committed status change,
//! conversion or payment. Sinks are injected; nothing here is global.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::workflow::types::DocumentType;

/// Something that happened to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A document moved between statuses.
    StatusChanged {
        /// Company ID.
        company_id: Uuid,
        /// Document type.
        document: DocumentType,
        /// Document ID.
        id: Uuid,
        /// Document number.
        number: String,
        /// Previous status.
        from: String,
        /// New status.
        to: String,
        /// Acting user.
        actor: Uuid,
    },
    /// A document produced a downstream document.
    DocumentConverted {
        /// Company ID.
        company_id: Uuid,
        /// Source document type.
        source: DocumentType,
        /// Source ID.
        source_id: Uuid,
        /// Target type; `None` for the in-place commercial switch.
        target: Option<DocumentType>,
        /// Target ID.
        target_id: Uuid,
        /// Target number.
        number: String,
    },
    /// A payment was recorded against a BRC or purchase order.
    PaymentRecorded {
        /// Company ID.
        company_id: Uuid,
        /// `"brc"` or `"purchase_order"`.
        entity: &'static str,
        /// Entity ID.
        id: Uuid,
        /// Payment amount.
        amount: Decimal,
        /// Resulting status text.
        status: String,
    },
}

impl WorkflowEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::DocumentConverted { .. } => "document_converted",
            Self::PaymentRecorded { .. } => "payment_recorded",
        }
    }
}

/// Receives workflow events.
pub trait NotificationSink: Send + Sync {
    /// Publishes an event. Must not fail the operation that produced it.
    fn publish(&self, event: &WorkflowEvent);
}

/// Discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn publish(&self, _event: &WorkflowEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn publish(&self, event: &WorkflowEvent) {
        let payload = serde_json::to_string(event).unwrap_or_default();
        tracing::info!(event = event.name(), %payload, "workflow event");
    }
}

/// Keeps events in memory; useful in tests and for batching.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<WorkflowEvent>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotifier {
    fn publish(&self, event: &WorkflowEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_changed() -> WorkflowEvent {
        WorkflowEvent::StatusChanged {
            company_id: Uuid::nil(),
            document: DocumentType::ProformaInvoice,
            id: Uuid::nil(),
            number: "PI-2025-001".to_string(),
            from: "pending".to_string(),
            to: "approved".to_string(),
            actor: Uuid::nil(),
        }
    }

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        let sink: Arc<dyn NotificationSink> = Arc::new(notifier.clone());
        sink.publish(&status_changed());
        sink.publish(&WorkflowEvent::PaymentRecorded {
            company_id: Uuid::nil(),
            entity: "brc",
            id: Uuid::nil(),
            amount: Decimal::ONE,
            status: "partial".to_string(),
        });

        let events = notifier.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "status_changed");
        assert_eq!(events[1].name(), "payment_recorded");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(status_changed()).unwrap();
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["document"], "proforma");
        assert_eq!(json["to"], "approved");
    }

    #[test]
    fn test_noop_and_tracing_accept_events() {
        NoopNotifier.publish(&status_changed());
        TracingNotifier.publish(&status_changed());
    }
}
