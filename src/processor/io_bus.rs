//! Fr0gIO bidirectional bus processor (§4.3, §6). Routes by `event_type`
//! rather than running the parse→filter→community→verdict pattern the other
//! five channels share: an `input_event` decodes to a nested `InputEvent`,
//! fans out per-channel `OutputCommand`s, and is scanned by a fixed
//! keyword/length/URL rule rather than submitted to the AI community client.
//! `status_update`/`error_notification` events are acknowledged only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ai::CommunityClient;
use crate::config::IoBusConfig;
use crate::model::{InputEvent, InputType, OutputCommand, WebhookRequest, WebhookResponse};
use crate::processor::{threat_analysis, Processor};
use crate::value::Coercer;

pub struct IoBusProcessor {
    config: IoBusConfig,
    client: Arc<dyn CommunityClient>,
}

impl IoBusProcessor {
    pub fn new(config: IoBusConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn parse_event(body: &Coercer) -> Option<InputEvent> {
        let event = body.object("event")?;
        let kind = InputType::parse(&event.string_or("type", ""))?;
        let mut input = InputEvent::new(kind, event.string_or("source", ""), event.string_or("content", ""));
        if let Some(id) = event.string("id") {
            input.id = id;
        }
        if let Some(priority) = event.int("priority") {
            input.priority = priority.max(0) as u32;
        }
        for (key, value) in event.string_map("metadata") {
            input = input.with_metadata(key, json!(value));
        }
        if let Some(is_private) = event.bool("is_private") {
            input = input.with_metadata("is_private", json!(is_private));
        }
        if let Some(channel) = event.string("channel") {
            input = input.with_metadata("channel", json!(channel));
        }
        if let Some(channel_id) = event.string("channel_id") {
            input = input.with_metadata("channel_id", json!(channel_id));
        }
        Some(input)
    }

    /// §4.3: sms/voice reply to the sender; irc replies to the channel
    /// unless the inbound message was private, in which case it replies to
    /// the sender directly; discord replies to the originating channel_id.
    /// Email and sdcard events carry no reply path and generate nothing.
    fn output_command(event: &InputEvent) -> Option<OutputCommand> {
        let reply = "Event received and logged for review.";
        match event.kind {
            InputType::Sms => Some(OutputCommand::new(InputType::Sms, event.source.as_str(), reply)),
            InputType::Voice => Some(OutputCommand::new(InputType::Voice, event.source.as_str(), reply)),
            InputType::Irc => {
                let is_private = event.metadata.get("is_private").and_then(|v| v.as_bool()).unwrap_or(false);
                let target = if is_private {
                    event.source.clone()
                } else {
                    event.metadata.get("channel").and_then(|v| v.as_str()).unwrap_or(event.source.as_str()).to_string()
                };
                Some(OutputCommand::new(InputType::Irc, target, reply))
            }
            InputType::Discord => {
                let channel_id = event.metadata.get("channel_id").and_then(|v| v.as_str()).unwrap_or(event.source.as_str());
                Some(OutputCommand::new(InputType::Discord, channel_id, reply))
            }
            InputType::Email | InputType::Sdcard => None,
        }
    }
}

impl Clone for IoBusProcessor {
    fn clone(&self) -> Self {
        Self {
            config: IoBusConfig { policy: self.config.policy.clone(), community_topic: self.config.community_topic.clone() },
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl Processor for IoBusProcessor {
    fn tag(&self) -> &str {
        "io_bus"
    }

    fn description(&self) -> &str {
        "Routes Fr0gIO bus events and runs a deterministic threat scan on inbound content."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let event_type = body.string_or("event_type", "");

        match event_type.as_str() {
            "input_event" => {
                let Some(event) = Self::parse_event(&body) else {
                    return WebhookResponse::err(&request.id, "io_bus input_event is missing or malformed 'event'");
                };

                let mut data = HashMap::new();
                data.insert("event_id".to_string(), json!(event.id));
                data.insert("type".to_string(), json!(event.kind.to_string()));

                if let Some(command) = Self::output_command(&event) {
                    data.insert(
                        "output_commands".to_string(),
                        json!([{"channel": command.channel.to_string(), "target": command.target, "content": command.content}]),
                    );
                }

                if let Some(analysis) = threat_analysis::analyze(&event.content) {
                    data.insert("threat_level".to_string(), json!(analysis.threat_level.to_string()));
                    data.insert("threat_score".to_string(), json!(analysis.score));
                    data.insert("threat_tags".to_string(), json!(analysis.tags));
                    data.insert(
                        "indicators".to_string(),
                        json!(analysis.indicators.iter().map(|i| json!({"category": i.category, "confidence": i.confidence})).collect::<Vec<_>>()),
                    );
                    data.insert("mitigation".to_string(), json!(analysis.mitigation));
                }

                WebhookResponse::ok(&request.id, format!("input_event routed for '{}'", event.kind)).with_data(data)
            }
            "status_update" => {
                let status = body.object("event").map(|e| e.string_or("status", "unknown")).unwrap_or_else(|| "unknown".to_string());
                let mut data = HashMap::new();
                data.insert("status".to_string(), json!(status));
                WebhookResponse::ok(&request.id, "status update acknowledged").with_data(data)
            }
            "error_notification" => {
                let error = body.object("event").and_then(|e| e.string("error")).unwrap_or_else(|| "unspecified error".to_string());
                let mut data = HashMap::new();
                data.insert("error".to_string(), json!(error));
                WebhookResponse::ok(&request.id, "error notification acknowledged").with_data(data)
            }
            _ => WebhookResponse::err(&request.id, format!("io_bus event has unknown or missing event_type '{event_type}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use serde_json::json;

    fn processor() -> IoBusProcessor {
        IoBusProcessor::new(IoBusConfig::default(), Arc::new(StubCommunityClient::new()))
    }

    fn req(body: serde_json::Value) -> WebhookRequest {
        WebhookRequest::new("req_1".to_string(), "io_bus".to_string(), "io_bus".to_string(), Default::default(), body)
    }

    #[tokio::test]
    async fn unknown_event_type_is_rejected() {
        let p = processor();
        let resp = p.process_webhook(req(json!({"event_type": "bogus"}))).await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn benign_sms_input_event_gets_an_output_command_and_no_analysis() {
        let p = processor();
        let body = json!({"event_type": "input_event", "event": {"type": "sms", "source": "+15550001111", "content": "running late"}});
        let resp = p.process_webhook(req(body)).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert!(data.contains_key("output_commands"));
        assert!(!data.contains_key("threat_level"));
    }

    #[tokio::test]
    async fn malware_keyword_surfaces_a_high_threat_analysis() {
        let p = processor();
        let body = json!({"event_type": "input_event", "event": {"type": "discord", "source": "u1", "content": "payload contains malware", "channel_id": "c1"}});
        let resp = p.process_webhook(req(body)).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data.get("threat_level").unwrap(), &json!("high"));
    }

    #[tokio::test]
    async fn private_irc_event_replies_to_the_sender_not_the_channel() {
        let p = processor();
        let body = json!({
            "event_type": "input_event",
            "event": {"type": "irc", "source": "alice", "content": "hi", "channel": "#general", "is_private": true}
        });
        let resp = p.process_webhook(req(body)).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        let commands = data.get("output_commands").unwrap().as_array().unwrap();
        assert_eq!(commands[0].get("target").unwrap(), &json!("alice"));
    }

    #[tokio::test]
    async fn public_irc_event_replies_to_the_channel() {
        let p = processor();
        let body = json!({
            "event_type": "input_event",
            "event": {"type": "irc", "source": "alice", "content": "hi", "channel": "#general", "is_private": false}
        });
        let resp = p.process_webhook(req(body)).await;
        let data = resp.data.unwrap();
        let commands = data.get("output_commands").unwrap().as_array().unwrap();
        assert_eq!(commands[0].get("target").unwrap(), &json!("#general"));
    }

    #[tokio::test]
    async fn email_event_generates_no_output_command() {
        let p = processor();
        let body = json!({"event_type": "input_event", "event": {"type": "email", "source": "a@b.com", "content": "hi"}});
        let resp = p.process_webhook(req(body)).await;
        let data = resp.data.unwrap();
        assert!(!data.contains_key("output_commands"));
    }

    #[tokio::test]
    async fn status_update_is_acknowledged() {
        let p = processor();
        let resp = p.process_webhook(req(json!({"event_type": "status_update", "event": {"status": "degraded"}}))).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap().get("status").unwrap(), &json!("degraded"));
    }

    #[tokio::test]
    async fn error_notification_is_acknowledged() {
        let p = processor();
        let resp = p.process_webhook(req(json!({"event_type": "error_notification", "event": {"error": "connector timeout"}}))).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap().get("error").unwrap(), &json!("connector timeout"));
    }
}
