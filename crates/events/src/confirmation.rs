//! Fire-and-forget order confirmation delivery.
//!
//! [`ConfirmationDispatcher`] subscribes to the [`EventBus`](crate::EventBus)
//! and hands every `order.paid` snapshot to a [`NotificationSender`].
//! Delivery failures are logged and dropped; the order is already committed.

use std::sync::Arc;

use boxoffice_core::notification::NotificationSender;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::CheckoutEvent;

/// Background service that delivers order confirmations.
pub struct ConfirmationDispatcher {
    sender: Arc<dyn NotificationSender>,
}

impl ConfirmationDispatcher {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    /// Run the dispatch loop until `cancel` fires or the bus is dropped.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<CheckoutEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Confirmation dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        self.handle(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            "Confirmation dispatcher lagged, some confirmations were not sent"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, confirmation dispatcher shutting down");
                        break;
                    }
                },
            }
        }
    }

    /// Deliver one event if it is an order confirmation. Returns whether a
    /// delivery was attempted and succeeded.
    pub async fn handle(&self, event: &CheckoutEvent) -> bool {
        let Some(confirmation) = event.confirmation() else {
            return false;
        };

        match self.sender.send_order_confirmation(&confirmation).await {
            Ok(()) => {
                tracing::debug!(order_id = confirmation.order_id, "Order confirmation sent");
                true
            }
            Err(e) => {
                tracing::warn!(
                    order_id = confirmation.order_id,
                    error = %e,
                    "Order confirmation failed; order remains paid",
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use boxoffice_core::notification::{NotificationError, OrderConfirmation};
    use chrono::Utc;

    use super::*;
    use crate::bus::EventBus;

    #[derive(Default)]
    struct CountingSender {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSender for CountingSender {
        async fn send_order_confirmation(
            &self,
            _confirmation: &OrderConfirmation,
        ) -> Result<(), NotificationError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError("smtp down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn paid_event() -> CheckoutEvent {
        CheckoutEvent::order_paid(&OrderConfirmation {
            order_id: 1,
            tenant_id: 1,
            session_id: 1,
            buyer_name: "Ana".to_string(),
            buyer_email: "ana@example.com".to_string(),
            total_amount_cents: 11200,
            currency_code: "BRL".to_string(),
            paid_at: Utc::now(),
            tickets: vec![],
        })
    }

    #[tokio::test]
    async fn delivers_order_paid_events_only() {
        let sender = Arc::new(CountingSender::default());
        let dispatcher = ConfirmationDispatcher::new(sender.clone());

        assert!(dispatcher.handle(&paid_event()).await);
        assert!(!dispatcher.handle(&CheckoutEvent::new("hold.created")).await);
        assert_eq!(sender.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let sender = Arc::new(CountingSender {
            sent: AtomicUsize::new(0),
            fail: true,
        });
        let dispatcher = ConfirmationDispatcher::new(sender.clone());

        assert!(!dispatcher.handle(&paid_event()).await);
        assert_eq!(sender.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let bus = EventBus::default();
        let dispatcher = ConfirmationDispatcher::new(Arc::new(CountingSender::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Returns immediately because the token is already cancelled.
        dispatcher.run(bus.subscribe(), cancel).await;
    }

    #[tokio::test]
    async fn run_delivers_published_confirmations() {
        let bus = EventBus::default();
        let sender = Arc::new(CountingSender::default());
        let dispatcher = ConfirmationDispatcher::new(sender.clone());
        let cancel = CancellationToken::new();

        let receiver = bus.subscribe();
        bus.publish(CheckoutEvent::new("hold.created"));
        bus.publish(paid_event());

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { dispatcher.run(receiver, cancel).await })
        };

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while sender.sent.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("confirmation was not delivered");

        cancel.cancel();
        handle.await.expect("dispatcher task panicked");
        assert_eq!(sender.sent.load(Ordering::SeqCst), 1);
    }
}
