//! Best-effort domain event fan-out over NATS

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventBus {
    nats: Option<async_nats::Client>,
}

impl EventBus {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Events are only traced when no broker is configured.
    pub fn disconnected() -> Self { Self::default() }

    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disconnected() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(url, "connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "NATS unavailable, events will only be logged");
                Self::disconnected()
            }
        }
    }

    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        let Some(client) = &self.nats else {
            tracing::debug!(%subject, "event");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(%subject, error = %e, "could not encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %e, "event publish failed");
        }
    }

    pub async fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events { self.publish(event).await; }
    }
}
