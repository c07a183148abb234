//! Subscription and delivery abstractions
//!
//! A [`Subscription`] hands out [`DeliveryEvent`]s one at a time. Each event
//! owns an acknowledgment handle that is consumed by exactly one of
//! [`DeliveryEvent::ack`] or [`DeliveryEvent::nack`].

#![allow(dead_code)]

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors raised by a subscription transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("receive error: {0}")]
    Receive(String),

    #[error("acknowledge error: {0}")]
    Acknowledge(String),

    #[error("subscription stream closed")]
    Closed,
}

/// Broker-side handle resolving one delivery
#[async_trait]
pub trait AckHandle: Send {
    /// Mark the message consumed
    async fn ack(self: Box<Self>) -> Result<(), SubscriptionError>;

    /// Return the message to the broker for redelivery
    async fn nack(self: Box<Self>) -> Result<(), SubscriptionError>;
}

/// Source of delivery events that may be shared across correlation windows
#[async_trait]
pub trait Subscription: Send + Sync {
    /// Wait for the next delivery. Dropping the returned future must not
    /// lose a message that was already handed out.
    async fn receive(&self) -> Result<DeliveryEvent, SubscriptionError>;
}

/// Payload of a delivery after it has been resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub id: String,
    pub data: Vec<u8>,
}

impl ReceivedMessage {
    /// Lossy UTF-8 view of the payload
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// One inbound message plus its pending acknowledgment
pub struct DeliveryEvent {
    message: ReceivedMessage,
    handle: Box<dyn AckHandle>,
}

impl DeliveryEvent {
    pub fn new(id: impl Into<String>, data: Vec<u8>, handle: Box<dyn AckHandle>) -> Self {
        Self {
            message: ReceivedMessage {
                id: id.into(),
                data,
            },
            handle,
        }
    }

    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn data(&self) -> &[u8] {
        &self.message.data
    }

    /// Whether the raw payload contains `token`
    pub fn contains(&self, token: &str) -> bool {
        let needle = token.as_bytes();
        if needle.is_empty() {
            return true;
        }
        self.message
            .data
            .windows(needle.len())
            .any(|window| window == needle)
    }

    /// Acknowledge and keep the payload. The message is returned even when
    /// the broker call fails so the caller can still report the match.
    pub async fn ack(self) -> (ReceivedMessage, Result<(), SubscriptionError>) {
        let result = self.handle.ack().await;
        (self.message, result)
    }

    pub async fn nack(self) -> Result<(), SubscriptionError> {
        self.handle.nack().await
    }
}

impl fmt::Debug for DeliveryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryEvent")
            .field("id", &self.message.id)
            .field("len", &self.message.data.len())
            .finish()
    }
}
