//! Publishes the domain event for a reconciled callback.

use std::sync::Arc;

use pgcb_sdk::objects::Notification;

use crate::events::{CallbackEvent, EventPublisher};

#[derive(Clone)]
pub struct EventNotifier {
    publisher: Arc<dyn EventPublisher>,
}

impl EventNotifier {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Best-effort dispatch. A failure is logged and never reaches the caller.
    pub fn notify(&self, notification: &Notification, completed: bool) {
        let event = CallbackEvent::from_notification(notification, completed);
        let name = event.name;
        if let Err(e) = self.publisher.dispatch(event) {
            tracing::error!(
                error = %e,
                event = %name,
                merchant_reference = %notification.merchant_reference,
                "Failed to dispatch callback event"
            );
        }
    }
}
