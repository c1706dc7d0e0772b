use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services. Consumed in-process by
/// [`process_events`], which writes them to the structured log; the enum is
/// serializable so a future consumer can ship them elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded { user_id: Uuid, course_id: Uuid },
    CartItemRemoved { user_id: Uuid, course_id: Uuid },
    CartCleared { user_id: Uuid },

    // Order events
    OrderCreated(Uuid),
    OrderCompleted(Uuid),
    PaymentConfirmed { order_id: Uuid, transaction_id: String },
    CouponRedeemed { coupon_id: Uuid, order_id: Uuid },

    // Learning events
    EnrollmentCreated { user_id: Uuid, course_id: Uuid },
    LessonCompleted { user_id: Uuid, lesson_id: Uuid },
    CourseCompleted { user_id: Uuid, course_id: Uuid },
    QuizSubmitted { user_id: Uuid, quiz_id: Uuid, passed: bool },
    CertificateIssued(Uuid),

    // Account events
    UserRegistered(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, failing if the channel is closed or full.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Sends an event, logging instead of propagating delivery failures.
    /// Event delivery is never allowed to fail a request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event.clone()).await {
            warn!(?event, %err, "event delivery failed");
        }
    }
}

/// Creates a bounded event channel.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Event consumer task. Runs until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(id) => info!(order_id = %id, "event: order created"),
            Event::OrderCompleted(id) => info!(order_id = %id, "event: order completed"),
            Event::PaymentConfirmed {
                order_id,
                transaction_id,
            } => {
                info!(%order_id, %transaction_id, "event: payment confirmed")
            }
            Event::CouponRedeemed { coupon_id, order_id } => {
                info!(%coupon_id, %order_id, "event: coupon redeemed")
            }
            Event::CertificateIssued(id) => info!(certificate_id = %id, "event: certificate issued"),
            other => info!(event = ?other, "event"),
        }
    }
    info!("event channel closed; consumer exiting");
}
