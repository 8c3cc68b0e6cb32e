// src/dispatch/bus.rs
//
// In-process message bus into the consumer context. One mpsc queue carries
// every inbound event, so the consumer task handles them strictly one at a
// time; request/response pairs get their own oneshot reply channel.

use super::error::DeliveryError;
use super::messages::{InboundMessage, Reply};
use crate::consumer::TabEvent;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

#[derive(Debug)]
pub enum ConsumerEvent {
    Message {
        message: InboundMessage,
        reply: oneshot::Sender<Reply>,
    },
    Tab(TabEvent),
    /// Extension (re)installed: forget every installed executor.
    Reinitialized,
}

#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: mpsc::Sender<ConsumerEvent>,
}

impl MessageBus {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ConsumerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Deliver a message and wait for the consumer's reply.
    pub async fn send(&self, message: InboundMessage) -> Result<Reply, DeliveryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ConsumerEvent::Message {
                message,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DeliveryError::Unreachable)?;

        // Consumer dropped the reply handle without answering.
        reply_rx.await.map_err(|_| DeliveryError::Unreachable)
    }

    pub async fn notify_tab(&self, event: TabEvent) -> Result<(), DeliveryError> {
        debug!("Forwarding tab event {:?}", event);
        self.tx
            .send(ConsumerEvent::Tab(event))
            .await
            .map_err(|_| DeliveryError::Unreachable)
    }

    pub async fn reinitialize(&self) -> Result<(), DeliveryError> {
        self.tx
            .send(ConsumerEvent::Reinitialized)
            .await
            .map_err(|_| DeliveryError::Unreachable)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirmation::Action;

    #[tokio::test]
    async fn test_send_waits_for_reply() {
        let (bus, mut rx) = MessageBus::channel(4);

        let consumer = tokio::spawn(async move {
            match rx.recv().await {
                Some(ConsumerEvent::Message { message, reply }) => {
                    assert_eq!(message, InboundMessage::gesture(Action::Stop));
                    let _ = reply.send(Reply::ok_with("reloaded"));
                }
                other => panic!("unexpected event {:?}", other),
            }
        });

        let reply = bus
            .send(InboundMessage::gesture(Action::Stop))
            .await
            .unwrap();
        assert_eq!(reply, Reply::ok_with("reloaded"));
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_consumer_is_unreachable() {
        let (bus, rx) = MessageBus::channel(4);
        drop(rx);

        assert!(bus.is_closed());
        let result = bus.send(InboundMessage::gesture(Action::Left)).await;
        assert_eq!(result, Err(DeliveryError::Unreachable));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_unreachable() {
        let (bus, mut rx) = MessageBus::channel(4);
        tokio::spawn(async move {
            // Receive and drop without answering.
            let _ = rx.recv().await;
        });

        let result = bus.send(InboundMessage::gesture(Action::Right)).await;
        assert_eq!(result, Err(DeliveryError::Unreachable));
    }
}
