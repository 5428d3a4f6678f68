//! Transport layer for access node communication

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::SdkError;

/// Transport trait for access node requests (object-safe)
///
/// Paths are relative to the node's REST root, e.g. `/v1/scripts`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` and return the JSON body
    async fn get(&self, path: &str) -> Result<Value, SdkError>;

    /// POST a JSON body to `path` and return the JSON body
    async fn post(&self, path: &str, body: Value) -> Result<Value, SdkError>;
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SdkError> {
    serde_json::from_value(value).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// HTTP method of a recorded request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Request path
    pub path: String,
    /// POST body
    pub body: Option<Value>,
}

type Reply = Result<Value, (u16, String)>;

#[derive(Default)]
struct MockState {
    queued: HashMap<(Method, String), VecDeque<Reply>>,
    fixed: HashMap<(Method, String), Reply>,
    requests: Vec<RecordedRequest>,
}

/// Mock transport for testing
///
/// Replies are looked up by method and exact path. Queued replies are
/// consumed first, in order; after that the fixed reply for the route is
/// returned on every call.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Id of the block returned by default for the latest sealed block
pub const MOCK_SEALED_BLOCK_ID: &str =
    "7bc42fe85d32ca513769a74f97f7e1a7bad6c9407f0d934c2aa645ef9cf613c7";

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.fixed.insert(
            (Method::Get, "/v1/blocks?height=sealed".to_string()),
            Ok(json!([{"header": {"id": MOCK_SEALED_BLOCK_ID, "height": "100"}}])),
        );
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, SdkError> {
        self.state
            .lock()
            .map_err(|_| SdkError::Transport("MockTransport mutex poisoned".to_string()))
    }

    /// Set the reply returned on every request to a route
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_response(&self, method: Method, path: &str, response: Value) {
        self.state
            .lock()
            .expect("MockTransport mutex poisoned")
            .fixed
            .insert((method, path.to_string()), Ok(response));
    }

    /// Set an error status returned on every request to a route
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_error(&self, method: Method, path: &str, status: u16, message: &str) {
        self.state
            .lock()
            .expect("MockTransport mutex poisoned")
            .fixed
            .insert((method, path.to_string()), Err((status, message.to_string())));
    }

    /// Queue a one-shot reply for a route
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn push_response(&self, method: Method, path: &str, response: Value) {
        self.state
            .lock()
            .expect("MockTransport mutex poisoned")
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Ok(response));
    }

    /// Requests received so far, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .expect("MockTransport mutex poisoned")
            .requests
            .clone()
    }

    /// Clear replies and recorded requests, keeping the defaults
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn clear_responses(&self) {
        let fresh = MockTransport::new();
        let defaults = std::mem::take(&mut *fresh.state.lock().expect("MockTransport mutex poisoned"));
        *self.state.lock().expect("MockTransport mutex poisoned") = defaults;
    }

    fn reply(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, SdkError> {
        let mut state = self.lock()?;
        state.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });

        let key = (method, path.to_string());
        let queued = state.queued.get_mut(&key).and_then(VecDeque::pop_front);
        let reply = match queued {
            Some(reply) => reply,
            None => state.fixed.get(&key).cloned().ok_or_else(|| SdkError::Rpc {
                code: 404,
                message: format!("no mock response for {:?} {}", method, path),
            })?,
        };

        reply.map_err(|(code, message)| SdkError::Rpc { code, message })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Value, SdkError> {
        self.reply(Method::Get, path, None)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, SdkError> {
        self.reply(Method::Post, path, Some(body))
    }
}

/// HTTP transport for a real access node
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<Value, SdkError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<NodeError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(SdkError::Rpc {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, SdkError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Self::read(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, SdkError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Self::read(response).await
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct NodeError {
    message: String,
}
