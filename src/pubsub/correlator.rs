//! Delivery event correlation
//!
//! Waits for the first message on a shared subscription whose payload
//! contains a token. Matches are acknowledged, everything else is
//! negatively acknowledged so other consumers can still receive it.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::subscription::{ReceivedMessage, Subscription, SubscriptionError};

/// Terminal result of one correlation window
pub type CorrelationResult = Result<ReceivedMessage, CorrelationError>;

/// Why no matching delivery was returned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("no matching message found for {token:?} within {}ms", .elapsed.as_millis())]
    Timeout { token: String, elapsed: Duration },

    #[error("subscription failed: {0}")]
    Subscription(#[from] SubscriptionError),

    #[error("correlation cancelled")]
    Cancelled,
}

impl CorrelationError {
    /// The event never arrived, as opposed to the listener failing
    pub fn is_timeout(&self) -> bool {
        matches!(self, CorrelationError::Timeout { .. })
    }
}

/// Correlates delivery events against tokens on a shared subscription
#[derive(Clone)]
pub struct Correlator {
    subscription: Arc<dyn Subscription>,
}

impl Correlator {
    pub fn new(subscription: Arc<dyn Subscription>) -> Self {
        Self { subscription }
    }

    /// Wait up to `timeout` for a message containing `token`
    pub async fn await_event(&self, token: &str, timeout: Duration) -> CorrelationResult {
        self.await_event_until(token, timeout, std::future::pending::<()>())
            .await
    }

    /// Like [`await_event`](Self::await_event), also giving up when `cancel`
    /// resolves. The listener is stopped and joined before this returns, so
    /// no ack or nack happens afterwards.
    pub async fn await_event_until<F>(
        &self,
        token: &str,
        timeout: Duration,
        cancel: F,
    ) -> CorrelationResult
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (result_tx, mut result_rx) = oneshot::channel();

        let listener = tokio::spawn(listen(
            self.subscription.clone(),
            token.to_string(),
            stop_rx,
            result_tx,
        ));
        let stop = StopGuard(stop_tx);

        let mut result = tokio::select! {
            published = &mut result_rx => published.unwrap_or_else(|_| {
                Err(SubscriptionError::Receive("listener exited without a result".to_string()).into())
            }),
            _ = tokio::time::sleep(timeout) => Err(CorrelationError::Timeout {
                token: token.to_string(),
                elapsed: start.elapsed(),
            }),
            _ = cancel => Err(CorrelationError::Cancelled),
        };

        drop(stop);
        if let Err(e) = listener.await {
            warn!("Correlation listener for {:?} panicked: {}", token, e);
        }

        // A match acknowledged while the deadline fired still wins.
        if result.is_err() {
            if let Ok(Ok(message)) = result_rx.try_recv() {
                result = Ok(message);
            }
        }

        match &result {
            Ok(message) => info!(
                "Matched {:?} in message {} after {}ms",
                token,
                message.id,
                start.elapsed().as_millis()
            ),
            Err(e) => warn!("Correlation for {:?} ended: {}", token, e),
        }
        result
    }
}

/// Signals the listener to stop when dropped
struct StopGuard(watch::Sender<bool>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        let _ = self.0.send(true);
    }
}

async fn listen(
    subscription: Arc<dyn Subscription>,
    token: String,
    mut stop: watch::Receiver<bool>,
    result: oneshot::Sender<CorrelationResult>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = stop.changed() => return,
            next = subscription.receive() => next,
        };

        let event = match next {
            Ok(event) => event,
            Err(e) => {
                let _ = result.send(Err(e.into()));
                return;
            }
        };

        if event.contains(&token) {
            let (message, acked) = event.ack().await;
            if let Err(e) = acked {
                warn!("Failed to acknowledge message {}: {}", message.id, e);
            }
            let _ = result.send(Ok(message));
            return;
        }

        debug!("Message {} does not contain {:?}", event.id(), token);
        let id = event.id().to_string();
        if let Err(e) = event.nack().await {
            warn!("Failed to nack message {}: {}", id, e);
        }
    }
}
