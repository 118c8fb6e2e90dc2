//! SMS channel processor (§4.3, §6). Trusted numbers skip review and pass
//! straight through; blocked numbers are rejected outright; everything else
//! goes through the community-review pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ai::CommunityClient;
use crate::config::SmsConfig;
use crate::model::{SmsMessage, WebhookRequest, WebhookResponse};
use crate::processor::identifier::normalize_phone;
use crate::processor::threshold::ThresholdTable;
use crate::processor::{review, Processor};
use crate::value::Coercer;

pub struct SmsProcessor {
    config: SmsConfig,
    client: Arc<dyn CommunityClient>,
}

impl SmsProcessor {
    pub fn new(config: SmsConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn parse(body: &Coercer) -> SmsMessage {
        SmsMessage {
            id: body.string("id"),
            from: body.string_or("from", ""),
            to: body.string("to"),
            body: body.string_or("body", ""),
            message_sid: body.string("message_sid"),
            status: body.string("status"),
            direction: body.string("direction"),
            country: body.string("country"),
            region: body.string("region"),
            carrier: body.string("carrier"),
            message_type: body.string("message_type"),
            media_urls: body.string_array("media_urls"),
            metadata: body.string_map("metadata"),
        }
    }
}

impl Clone for SmsProcessor {
    fn clone(&self) -> Self {
        Self {
            config: SmsConfig {
                policy: self.config.policy.clone(),
                community_topic: self.config.community_topic.clone(),
                trusted_numbers: self.config.trusted_numbers.clone(),
                blocked_numbers: self.config.blocked_numbers.clone(),
            },
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl Processor for SmsProcessor {
    fn tag(&self) -> &str {
        "sms"
    }

    fn description(&self) -> &str {
        "Normalizes and reviews inbound SMS message webhooks."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let message = Self::parse(&body);

        if message.from.is_empty() {
            return WebhookResponse::err(&request.id, "sms message is missing a sender");
        }

        let from = normalize_phone(&message.from);

        if self.config.blocked_numbers.iter().any(|n| normalize_phone(n) == from) {
            let mut data = HashMap::new();
            data.insert("action".to_string(), json!("blocked"));
            data.insert("reason".to_string(), json!("blocked_number"));
            return WebhookResponse::ok(&request.id, format!("sender '{}' is blocked", message.from)).with_data(data);
        }

        let trusted = self.config.trusted_numbers.iter().any(|n| normalize_phone(n) == from);
        let thresholds = if trusted { &ThresholdTable::TRUSTED } else { &ThresholdTable::DEFAULT };

        review::review_and_respond(self.client.as_ref(), &self.config.community_topic, &self.config.policy, thresholds, &request.id, &message.body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use serde_json::json;

    fn processor(config: SmsConfig) -> SmsProcessor {
        SmsProcessor::new(config, Arc::new(StubCommunityClient::new()))
    }

    fn req(body: serde_json::Value) -> WebhookRequest {
        WebhookRequest::new("req_1".to_string(), "sms".to_string(), "sms".to_string(), Default::default(), body)
    }

    #[tokio::test]
    async fn blocked_number_is_rejected() {
        let mut config = SmsConfig::default();
        config.blocked_numbers.push("+15551234567".to_string());
        let p = processor(config);
        let resp = p.process_webhook(req(json!({"from": "15551234567", "body": "hi"}))).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data.get("action").unwrap(), &json!("blocked"));
        assert_eq!(data.get("reason").unwrap(), &json!("blocked_number"));
    }

    #[tokio::test]
    async fn blocked_number_matches_after_normalization() {
        // Stored as E.164, submitted as a bare 10-digit local number — must
        // still match.
        let mut config = SmsConfig::default();
        config.blocked_numbers.push("+1 (555) 123-4567".to_string());
        let p = processor(config);
        let resp = p.process_webhook(req(json!({"from": "555-123-4567", "body": "hi"}))).await;
        assert_eq!(resp.data.unwrap().get("action").unwrap(), &json!("blocked"));
    }

    #[tokio::test]
    async fn trusted_number_proceeds_through_review_with_stricter_thresholds() {
        let mut config = SmsConfig::default();
        config.trusted_numbers.push("+15559990000".to_string());
        let p = processor(config);
        let resp = p.process_webhook(req(json!({"from": "+15559990000", "body": "wire transfer urgent"}))).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert!(data.contains_key("threat_level"));
    }

    #[tokio::test]
    async fn unknown_number_is_reviewed() {
        let p = processor(SmsConfig::default());
        let resp = p.process_webhook(req(json!({"from": "+15550001111", "body": "see you tonight"}))).await;
        assert!(resp.success);
        assert!(resp.data.is_some());
    }
}
