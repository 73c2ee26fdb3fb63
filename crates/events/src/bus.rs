//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Events are published only after the transaction that produced them has
//! committed, so a subscriber never observes a state that was rolled back.

use boxoffice_core::notification::OrderConfirmation;
use boxoffice_core::types::DbId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event name published once an order reaches PAID and its tickets exist.
pub const ORDER_PAID: &str = "order.paid";

/// Event name published after a paid order has been reversed.
pub const ORDER_REFUNDED: &str = "order.refunded";

// ---------------------------------------------------------------------------
// CheckoutEvent
// ---------------------------------------------------------------------------

/// A committed checkout state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutEvent {
    /// Dot-separated event name, e.g. `"order.paid"`.
    pub event_type: String,
    pub tenant_id: Option<DbId>,
    pub resource_type: Option<String>,
    pub resource_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl CheckoutEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            tenant_id: None,
            resource_type: None,
            resource_id: None,
            actor_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: DbId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_resource(mut self, resource_type: impl Into<String>, resource_id: DbId) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_actor(mut self, actor_id: Option<DbId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Build the `order.paid` event carrying the confirmation snapshot.
    pub fn order_paid(confirmation: &OrderConfirmation) -> Self {
        let payload = serde_json::to_value(confirmation).unwrap_or_default();
        Self::new(ORDER_PAID)
            .with_tenant(confirmation.tenant_id)
            .with_resource("order", confirmation.order_id)
            .with_payload(payload)
    }

    /// Decode the confirmation snapshot of an `order.paid` event.
    pub fn confirmation(&self) -> Option<OrderConfirmation> {
        if self.event_type != ORDER_PAID {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus, shared as `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<CheckoutEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: CheckoutEvent) {
        // A send error only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CheckoutEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::notification::ConfirmedTicket;

    fn confirmation() -> OrderConfirmation {
        OrderConfirmation {
            order_id: 10,
            tenant_id: 1,
            session_id: 3,
            buyer_name: "Ana".to_string(),
            buyer_email: "ana@example.com".to_string(),
            total_amount_cents: 11200,
            currency_code: "BRL".to_string(),
            paid_at: Utc::now(),
            tickets: vec![ConfirmedTicket {
                qr_code: "TKT-1".to_string(),
                sector_code: "A".to_string(),
                row_label: "1".to_string(),
                seat_number: 1,
            }],
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            CheckoutEvent::new("hold.created")
                .with_tenant(1)
                .with_resource("hold", 42)
                .with_actor(Some(7)),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "hold.created");
        assert_eq!(received.resource_type.as_deref(), Some("hold"));
        assert_eq!(received.resource_id, Some(42));
        assert_eq!(received.actor_id, Some(7));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(CheckoutEvent::new("orphan.event"));
    }

    #[test]
    fn order_paid_event_carries_confirmation() {
        let snapshot = confirmation();
        let event = CheckoutEvent::order_paid(&snapshot);

        assert_eq!(event.event_type, ORDER_PAID);
        assert_eq!(event.resource_id, Some(10));
        assert_eq!(event.confirmation(), Some(snapshot));
    }

    #[test]
    fn other_events_have_no_confirmation() {
        let event = CheckoutEvent::new(ORDER_REFUNDED).with_resource("order", 10);
        assert!(event.confirmation().is_none());
    }
}
