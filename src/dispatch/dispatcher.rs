// src/dispatch/dispatcher.rs

use super::bus::MessageBus;
use super::error::DeliveryError;
use super::messages::{InboundMessage, Reply};
use crate::confirmation::Action;
use crate::pipeline::PipelineMetrics;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Fire-and-forget delivery of confirmed actions.
///
/// Each dispatch runs on its own task so the frame loop never waits on the
/// consumer. A failed delivery is logged and counted, never retried: the
/// next confirmation after cooldown is the retry.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    bus: MessageBus,
    metrics: PipelineMetrics,
}

impl ActionDispatcher {
    pub fn new(bus: MessageBus, metrics: PipelineMetrics) -> Self {
        Self { bus, metrics }
    }

    /// The handle is only for callers that care about the outcome; dropping
    /// it does not cancel delivery.
    pub fn dispatch(&self, action: Action) -> JoinHandle<Result<Reply, DeliveryError>> {
        self.metrics.inc(&self.metrics.actions_dispatched);
        info!("📤 Dispatching {}", action);

        let bus = self.bus.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match bus.send(InboundMessage::gesture(action)).await {
                Ok(reply) => {
                    if reply.ok {
                        metrics.inc(&metrics.actions_delivered);
                    } else {
                        metrics.inc(&metrics.actions_refused);
                        warn!(
                            "Consumer could not perform {}: {}",
                            action,
                            reply.detail.as_deref().unwrap_or("no detail")
                        );
                    }
                    Ok(reply)
                }
                Err(e) => {
                    metrics.inc(&metrics.delivery_failures);
                    warn!("❌ Delivery of {} failed: {}", action, e);
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ConsumerEvent;

    #[tokio::test]
    async fn test_dispatch_counts_delivery() {
        let (bus, mut rx) = MessageBus::channel(4);
        let metrics = PipelineMetrics::new();
        let dispatcher = ActionDispatcher::new(bus, metrics.clone());

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let ConsumerEvent::Message { reply, .. } = event {
                    let _ = reply.send(Reply::ok());
                }
            }
        });

        let reply = dispatcher.dispatch(Action::ScrollUp).await.unwrap();
        assert_eq!(reply, Ok(Reply::ok()));
        assert_eq!(metrics.get(&metrics.actions_dispatched), 1);
        assert_eq!(metrics.get(&metrics.actions_delivered), 1);
    }

    #[tokio::test]
    async fn test_unreachable_consumer_is_logged_not_retried() {
        let (bus, rx) = MessageBus::channel(4);
        drop(rx);
        let metrics = PipelineMetrics::new();
        let dispatcher = ActionDispatcher::new(bus, metrics.clone());

        let result = dispatcher.dispatch(Action::Left).await.unwrap();
        assert_eq!(result, Err(DeliveryError::Unreachable));
        assert_eq!(metrics.get(&metrics.actions_dispatched), 1);
        assert_eq!(metrics.get(&metrics.delivery_failures), 1);
        assert_eq!(metrics.get(&metrics.actions_delivered), 0);
    }

    #[tokio::test]
    async fn test_refused_action_is_counted() {
        let (bus, mut rx) = MessageBus::channel(4);
        let metrics = PipelineMetrics::new();
        let dispatcher = ActionDispatcher::new(bus, metrics.clone());

        tokio::spawn(async move {
            if let Some(ConsumerEvent::Message { reply, .. }) = rx.recv().await {
                let _ = reply.send(Reply::failed("no active tab"));
            }
        });

        let reply = dispatcher.dispatch(Action::Stop).await.unwrap().unwrap();
        assert!(!reply.ok);
        assert_eq!(metrics.get(&metrics.actions_refused), 1);
    }
}
