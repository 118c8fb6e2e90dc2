use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as Json;

/// A decoded inbound webhook request, owned exclusively by its dispatching
/// handler for the lifetime of the request (§3 Ownership).
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub id: String,
    pub source: String,
    pub tag: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub headers: HashMap<String, String>,
    pub body: Json,
    pub metadata: HashMap<String, Json>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl WebhookRequest {
    pub fn new(id: String, source: String, tag: String, headers: HashMap<String, String>, body: Json) -> Self {
        Self {
            id,
            source,
            tag,
            timestamp: chrono::Utc::now(),
            headers,
            body,
            metadata: HashMap::new(),
            processed_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, Json>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl WebhookResponse {
    pub fn ok(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            request_id: request_id.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn err(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            request_id: request_id.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_data(mut self, data: HashMap<String, Json>) -> Self {
        self.data = Some(data);
        self
    }
}
