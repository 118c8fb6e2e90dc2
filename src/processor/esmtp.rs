//! ESMTP webhook-variant processor (§4.3). The interceptor in `crate::esmtp`
//! builds an `EmailThreatVector` straight off the wire and can call this
//! processor's handler directly; this module also exposes the same
//! normalization as a `POST /webhook/esmtp` route so upstream relays that
//! already speak webhooks can submit a vector without a raw SMTP session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ai::CommunityClient;
use crate::config::{EsmtpConfig, ReviewPolicy};
use crate::model::{EmailAttachment, EmailThreatVector, ThreatLevel, WebhookRequest, WebhookResponse};
use crate::processor::threshold::ThresholdTable;
use crate::processor::{review, Processor};
use crate::value::Coercer;

fn parse_threat_level(s: &str) -> Option<ThreatLevel> {
    Some(match s {
        "unknown" => ThreatLevel::Unknown,
        "minimal" => ThreatLevel::Minimal,
        "low" => ThreatLevel::Low,
        "medium" => ThreatLevel::Medium,
        "high" => ThreatLevel::High,
        "critical" => ThreatLevel::Critical,
        _ => return None,
    })
}

pub struct EsmtpProcessor {
    config: EsmtpConfig,
    client: Arc<dyn CommunityClient>,
}

impl EsmtpProcessor {
    pub fn new(config: EsmtpConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn policy(&self) -> ReviewPolicy {
        ReviewPolicy {
            persona_count: self.config.persona_count,
            review_timeout_ms: self.config.review_timeout_ms,
            required_consensus: self.config.required_consensus,
        }
    }

    fn parse(body: &Coercer) -> EmailThreatVector {
        let attachments = body
            .array("attachments")
            .map(|arr| {
                arr.iter()
                    .map(|v| {
                        let c = Coercer::new(v);
                        EmailAttachment {
                            filename: c.string_or("filename", "unnamed"),
                            content_type: c.string_or("content_type", "application/octet-stream"),
                            size: c.int_or("size", 0) as usize,
                            hash: c.string_or("hash", ""),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        EmailThreatVector::new(
            body.string_or("from", ""),
            body.string_array("to"),
            body.string_or("subject", ""),
            body.string_or("body", ""),
            body.string_map("headers"),
            attachments,
        )
    }

    /// The review entry point called both by the webhook route and by the
    /// raw ESMTP interceptor once it finalizes a `DATA` transaction. Updates
    /// `vector.threat_level` in place from the derived consensus verdict
    /// (§3's `EmailThreatVector.threat_level`) so the caller can act on or
    /// log the same level the response reports.
    pub async fn review_vector(&self, request_id: &str, vector: &mut EmailThreatVector) -> WebhookResponse {
        let content = format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}",
            vector.from,
            vector.to.join(", "),
            vector.subject,
            vector.body
        );
        let response =
            review::review_and_respond(self.client.as_ref(), &self.config.community_topic, &self.policy(), &ThresholdTable::DEFAULT, request_id, &content)
                .await;

        vector.threat_level = response
            .data
            .as_ref()
            .and_then(|d| d.get("threat_level"))
            .and_then(|v| v.as_str())
            .and_then(parse_threat_level)
            .unwrap_or(ThreatLevel::Unknown);

        response
    }
}

impl Clone for EsmtpProcessor {
    fn clone(&self) -> Self {
        Self {
            config: EsmtpConfig {
                host: self.config.host.clone(),
                port: self.config.port,
                tls_port: self.config.tls_port,
                hostname: self.config.hostname.clone(),
                max_message_size: self.config.max_message_size,
                timeout_secs: self.config.timeout_secs,
                enable_tls: self.config.enable_tls,
                cert_file: self.config.cert_file.clone(),
                key_file: self.config.key_file.clone(),
                community_topic: self.config.community_topic.clone(),
                persona_count: self.config.persona_count,
                review_timeout_ms: self.config.review_timeout_ms,
                required_consensus: self.config.required_consensus,
            },
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl Processor for EsmtpProcessor {
    fn tag(&self) -> &str {
        "esmtp"
    }

    fn description(&self) -> &str {
        "Normalizes and reviews email threat vectors submitted via webhook."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let mut vector = Self::parse(&body);

        if vector.from.is_empty() || vector.to.is_empty() {
            return WebhookResponse::err(&request.id, "email vector is missing 'from' or 'to'");
        }

        self.review_vector(&request.id, &mut vector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use serde_json::json;

    #[tokio::test]
    async fn missing_recipients_is_rejected() {
        let p = EsmtpProcessor::new(EsmtpConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_1".to_string(),
            "esmtp".to_string(),
            "esmtp".to_string(),
            Default::default(),
            json!({"from": "a@example.com"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn well_formed_vector_is_reviewed() {
        let p = EsmtpProcessor::new(EsmtpConfig::default(), Arc::new(StubCommunityClient::new()));
        let req = WebhookRequest::new(
            "req_2".to_string(),
            "esmtp".to_string(),
            "esmtp".to_string(),
            Default::default(),
            json!({"from": "a@example.com", "to": ["b@example.com"], "subject": "hi", "body": "see you soon"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
    }
}
