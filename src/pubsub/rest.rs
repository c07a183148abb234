//! Google Cloud Pub/Sub pull subscription over the REST API
//!
//! Nack is expressed as `modifyAckDeadline` with a zero deadline, which makes
//! the message immediately eligible for redelivery.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::subscription::{AckHandle, DeliveryEvent, Subscription, SubscriptionError};
use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Public Pub/Sub endpoint
pub const PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Pause between empty pulls
const IDLE_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    max_messages: u32,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<WireReceivedMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceivedMessage {
    ack_id: String,
    message: WireMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(default)]
    data: String,
    #[serde(default)]
    message_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest<'a> {
    ack_ids: [&'a str; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyAckDeadlineRequest<'a> {
    ack_ids: [&'a str; 1],
    ack_deadline_seconds: u32,
}

#[derive(Clone)]
struct SubscriptionApi {
    client: HttpClient,
    endpoint: String,
    project_id: String,
    subscription_id: String,
    access_token: Option<String>,
}

impl SubscriptionApi {
    fn url(&self, verb: &str) -> String {
        format!(
            "{}/v1/projects/{}/subscriptions/{}:{}",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.subscription_id,
            verb
        )
    }

    async fn call<T: Serialize>(&self, verb: &str, body: &T) -> Result<HttpResponse, HttpError> {
        let mut request = HttpRequest::post(self.url(verb)).json(body)?;
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        self.client.send(request).await
    }

    async fn resolve<T: Serialize>(&self, verb: &str, body: &T) -> Result<(), SubscriptionError> {
        let response = self
            .call(verb, body)
            .await
            .map_err(|e| SubscriptionError::Acknowledge(e.to_string()))?;
        if !response.is_success() {
            return Err(SubscriptionError::Acknowledge(format!(
                "{verb} returned {}: {}",
                response.status_code, response.body
            )));
        }
        Ok(())
    }

    /// One pull; `Ok(None)` when the subscription had nothing to deliver
    async fn pull(&self) -> Result<Option<WireReceivedMessage>, SubscriptionError> {
        let response = match self.call("pull", &PullRequest { max_messages: 1 }).await {
            Ok(response) => response,
            Err(HttpError::Timeout(_)) => return Ok(None),
            Err(e) => return Err(SubscriptionError::Receive(e.to_string())),
        };
        if !response.is_success() {
            return Err(SubscriptionError::Receive(format!(
                "pull returned {}: {}",
                response.status_code, response.body
            )));
        }

        let pulled: PullResponse = if response.body.trim().is_empty() {
            PullResponse::default()
        } else {
            response
                .json()
                .map_err(|e| SubscriptionError::Receive(e.to_string()))?
        };
        Ok(pulled.received_messages.into_iter().next())
    }
}

/// Pull subscription on Pub/Sub or its emulator
pub struct RestSubscription {
    api: Arc<SubscriptionApi>,
}

impl RestSubscription {
    pub fn new(
        client: HttpClient,
        project_id: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            api: Arc::new(SubscriptionApi {
                client,
                endpoint: PUBSUB_ENDPOINT.to_string(),
                project_id: project_id.into(),
                subscription_id: subscription_id.into(),
                access_token: None,
            }),
        }
    }

    /// Point at another endpoint, e.g. `http://localhost:8085` for the emulator
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_mut().endpoint = endpoint.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.api_mut().access_token = Some(token.into());
        self
    }

    fn api_mut(&mut self) -> &mut SubscriptionApi {
        Arc::make_mut(&mut self.api)
    }
}

#[async_trait]
impl Subscription for RestSubscription {
    /// Messages are pulled one at a time. If this future is dropped while a
    /// pull is in flight, that message is redelivered once its ack deadline
    /// lapses.
    async fn receive(&self) -> Result<DeliveryEvent, SubscriptionError> {
        loop {
            let Some(received) = self.api.pull().await? else {
                tokio::time::sleep(IDLE_BACKOFF).await;
                continue;
            };

            let handle = RestAckHandle {
                api: self.api.clone(),
                ack_id: received.ack_id,
            };
            let message_id = received.message.message_id;

            let data = match STANDARD.decode(received.message.data.as_bytes()) {
                Ok(data) => data,
                Err(e) => {
                    // Undecodable deliveries are returned to the broker
                    warn!("Message {} has invalid data: {}", message_id, e);
                    Box::new(handle).nack().await?;
                    continue;
                }
            };
            debug!("Pulled message {} ({} bytes)", message_id, data.len());

            return Ok(DeliveryEvent::new(message_id, data, Box::new(handle)));
        }
    }
}

struct RestAckHandle {
    api: Arc<SubscriptionApi>,
    ack_id: String,
}

#[async_trait]
impl AckHandle for RestAckHandle {
    async fn ack(self: Box<Self>) -> Result<(), SubscriptionError> {
        let body = AcknowledgeRequest {
            ack_ids: [self.ack_id.as_str()],
        };
        self.api.resolve("acknowledge", &body).await
    }

    async fn nack(self: Box<Self>) -> Result<(), SubscriptionError> {
        let body = ModifyAckDeadlineRequest {
            ack_ids: [self.ack_id.as_str()],
            ack_deadline_seconds: 0,
        };
        self.api.resolve("modifyAckDeadline", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::correlator::{CorrelationError, Correlator};
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Broker {
        queue: Arc<Mutex<VecDeque<(String, String, String)>>>,
        calls: Arc<Mutex<Vec<(String, Value)>>>,
        authorized: Arc<Mutex<bool>>,
        deny_pull: bool,
    }

    impl Broker {
        fn push(&self, ack_id: &str, message_id: &str, data: &str) {
            self.push_raw(ack_id, message_id, &STANDARD.encode(data));
        }

        /// Queue a message whose `data` field is sent as-is
        fn push_raw(&self, ack_id: &str, message_id: &str, data: &str) {
            self.queue.lock().unwrap().push_back((
                ack_id.to_string(),
                message_id.to_string(),
                data.to_string(),
            ));
        }
    }

    async fn handle(
        State(broker): State<Broker>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let verb = uri.path().rsplit(':').next().unwrap_or_default().to_string();
        if headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer test-token")
        {
            *broker.authorized.lock().unwrap() = true;
        }
        broker.calls.lock().unwrap().push((verb.clone(), body));

        match verb.as_str() {
            "pull" if broker.deny_pull => (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"message": "denied"}})),
            ),
            "pull" => match broker.queue.lock().unwrap().pop_front() {
                Some((ack_id, message_id, data)) => (
                    StatusCode::OK,
                    Json(json!({"receivedMessages": [
                        {"ackId": ack_id, "message": {"data": data, "messageId": message_id}}
                    ]})),
                ),
                None => (StatusCode::OK, Json(json!({}))),
            },
            _ => (StatusCode::OK, Json(json!({}))),
        }
    }

    async fn spawn(broker: Broker) -> String {
        let app = Router::new().fallback(handle).with_state(broker);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn subscription(endpoint: String) -> RestSubscription {
        RestSubscription::new(
            HttpClient::with_timeout(Duration::from_secs(5)).unwrap(),
            "proj",
            "deliveries",
        )
        .with_endpoint(endpoint)
        .with_access_token("test-token")
    }

    #[test]
    fn test_resource_url() {
        let sub = subscription("http://localhost:8085/".to_string());
        assert_eq!(
            sub.api.url("pull"),
            "http://localhost:8085/v1/projects/proj/subscriptions/deliveries:pull"
        );
    }

    #[tokio::test]
    async fn test_correlation_over_rest() {
        let broker = Broker::default();
        broker.push("ack-1", "m-1", r#"{"test":"TC-002"}"#);
        broker.push("ack-2", "m-2", r#"{"test":"TC-001 Text Event"}"#);
        let endpoint = spawn(broker.clone()).await;

        let correlator = Correlator::new(Arc::new(subscription(endpoint)));
        let message = correlator
            .await_event("TC-001", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(message.id, "m-2");
        assert_eq!(message.text(), r#"{"test":"TC-001 Text Event"}"#);
        assert!(*broker.authorized.lock().unwrap());

        let calls = broker.calls.lock().unwrap().clone();
        let resolutions: Vec<_> = calls.iter().filter(|(verb, _)| verb != "pull").collect();
        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].0, "modifyAckDeadline");
        assert_eq!(
            resolutions[0].1,
            json!({"ackIds": ["ack-1"], "ackDeadlineSeconds": 0})
        );
        assert_eq!(resolutions[1].0, "acknowledge");
        assert_eq!(resolutions[1].1, json!({"ackIds": ["ack-2"]}));
        assert_eq!(calls[0].1, json!({"maxMessages": 1}));
    }

    #[tokio::test]
    async fn test_undecodable_message_is_nacked_and_skipped() {
        let broker = Broker::default();
        broker.push_raw("ack-bad", "m-bad", "!!!not-base64!!!");
        broker.push("ack-2", "m-2", "TC-001");
        let endpoint = spawn(broker.clone()).await;

        let correlator = Correlator::new(Arc::new(subscription(endpoint)));
        let message = correlator
            .await_event("TC-001", Duration::from_secs(3))
            .await
            .unwrap();
        assert_eq!(message.id, "m-2");

        let calls = broker.calls.lock().unwrap().clone();
        let resolutions: Vec<_> = calls.iter().filter(|(verb, _)| verb != "pull").collect();
        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].0, "modifyAckDeadline");
        assert_eq!(
            resolutions[0].1,
            json!({"ackIds": ["ack-bad"], "ackDeadlineSeconds": 0})
        );
        assert_eq!(resolutions[1].0, "acknowledge");
        assert_eq!(resolutions[1].1, json!({"ackIds": ["ack-2"]}));
    }

    #[tokio::test]
    async fn test_pull_failure_surfaces() {
        let broker = Broker {
            deny_pull: true,
            ..Broker::default()
        };
        let endpoint = spawn(broker).await;

        let correlator = Correlator::new(Arc::new(subscription(endpoint)));
        let err = correlator
            .await_event("TC-001", Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            CorrelationError::Subscription(SubscriptionError::Receive(msg)) => {
                assert!(msg.contains("403"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
