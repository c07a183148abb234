//! In-process subscription used by tests
//!
//! Messages are pushed through a channel; every ack/nack is appended to a
//! shared log so tests can assert how each delivery was resolved.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use super::subscription::{AckHandle, DeliveryEvent, Subscription, SubscriptionError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Ack(String),
    Nack(String),
}

#[derive(Clone, Default)]
pub struct ResolutionLog(Arc<Mutex<Vec<Resolution>>>);

impl ResolutionLog {
    pub fn entries(&self) -> Vec<Resolution> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn push(&self, resolution: Resolution) {
        self.0.lock().unwrap().push(resolution);
    }
}

struct LoggedHandle {
    id: String,
    log: ResolutionLog,
}

#[async_trait]
impl AckHandle for LoggedHandle {
    async fn ack(self: Box<Self>) -> Result<(), SubscriptionError> {
        let LoggedHandle { id, log } = *self;
        log.push(Resolution::Ack(id));
        Ok(())
    }

    async fn nack(self: Box<Self>) -> Result<(), SubscriptionError> {
        let LoggedHandle { id, log } = *self;
        log.push(Resolution::Nack(id));
        Ok(())
    }
}

enum Item {
    Message(String, Vec<u8>),
    Fail(SubscriptionError),
}

/// Producer side of a [`MemorySubscription`]
#[derive(Clone)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Item>,
}

impl Publisher {
    pub fn publish(&self, id: &str, data: &str) {
        let _ = self
            .tx
            .send(Item::Message(id.to_string(), data.as_bytes().to_vec()));
    }

    pub fn fail(&self, error: SubscriptionError) {
        let _ = self.tx.send(Item::Fail(error));
    }
}

pub struct MemorySubscription {
    rx: AsyncMutex<mpsc::UnboundedReceiver<Item>>,
    log: ResolutionLog,
}

impl MemorySubscription {
    pub fn new() -> (Self, Publisher, ResolutionLog) {
        let (tx, rx) = mpsc::unbounded_channel();
        let log = ResolutionLog::default();
        let subscription = Self {
            rx: AsyncMutex::new(rx),
            log: log.clone(),
        };
        (subscription, Publisher { tx }, log)
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn receive(&self) -> Result<DeliveryEvent, SubscriptionError> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(Item::Message(id, data)) => {
                let handle = LoggedHandle {
                    id: id.clone(),
                    log: self.log.clone(),
                };
                Ok(DeliveryEvent::new(id, data, Box::new(handle)))
            }
            Some(Item::Fail(error)) => Err(error),
            None => Err(SubscriptionError::Closed),
        }
    }
}
