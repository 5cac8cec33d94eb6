use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::entities::order::OrderStatus;

/// Events emitted by the service layer after a transaction commits. Nothing
/// is sent from inside an open transaction, so a rolled-back operation never
/// produces an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: i32,
        user_id: i32,
    },
    OrderStatusChanged {
        order_id: i32,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderDeleted {
        order_id: i32,
    },
    InvoiceIssued {
        order_id: i32,
        invoice_number: String,
    },
    CartCleared {
        user_id: i32,
    },
    ProductCreated {
        product_id: i32,
    },
    ProductUpdated {
        product_id: i32,
    },
    ProductDeleted {
        product_id: i32,
    },
    StockAdjusted {
        product_id: i32,
        new_stock: i32,
    },
    UserRegistered {
        user_id: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Builds a connected sender/receiver pair with a bounded buffer.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Background consumer. Currently logs each event; external delivery
/// (webhooks, queues) would hang off this loop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "Processing event");
    }
    info!("Event channel closed, processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (sender, mut rx) = channel(8);

        sender
            .send(Event::OrderCreated {
                order_id: 1,
                user_id: 2,
            })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::OrderCreated { order_id, user_id }) => {
                assert_eq!(order_id, 1);
                assert_eq!(user_id, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (sender, rx) = channel(1);
        drop(rx);

        let result = sender.send(Event::CartCleared { user_id: 9 }).await;
        assert!(result.is_err());
    }
}
