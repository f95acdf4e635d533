use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted after a transaction commits. Delivery is
/// best-effort and never part of the transaction itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PurchaseRequestCreated {
        id: i64,
        reference: String,
    },
    PurchaseRequestSubmitted {
        id: i64,
        reference: String,
    },
    PurchaseRequestCompleted {
        id: i64,
        reference: String,
    },
    PurchaseRequestRejected {
        id: i64,
        reference: String,
    },
    PurchaseRequestDeleted {
        id: i64,
        reference: String,
    },
    StockReceived {
        warehouse_id: i64,
        product_id: i64,
        quantity: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
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

/// Creates a bounded event channel with the given capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes events from the channel and logs them. Runs until all senders
/// are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::PurchaseRequestCreated { id, reference } => {
                info!(id, reference, "Purchase request created");
            }
            Event::PurchaseRequestSubmitted { id, reference } => {
                info!(id, reference, "Purchase request submitted to hub");
            }
            Event::PurchaseRequestCompleted { id, reference } => {
                info!(id, reference, "Purchase request completed");
            }
            Event::PurchaseRequestRejected { id, reference } => {
                info!(id, reference, "Purchase request rejected by vendor");
            }
            Event::PurchaseRequestDeleted { id, reference } => {
                info!(id, reference, "Purchase request deleted");
            }
            Event::StockReceived {
                warehouse_id,
                product_id,
                quantity,
            } => {
                info!(warehouse_id, product_id, quantity, "Stock received");
            }
        }
    }
}
