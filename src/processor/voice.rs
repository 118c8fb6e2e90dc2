//! Voice channel processor (§4.3, §6). Same trusted/blocked shortcut shape
//! as SMS, reviewing the call transcription rather than a text body.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ai::CommunityClient;
use crate::config::VoiceConfig;
use crate::model::{VoiceAnalysis, VoiceMessage, WebhookRequest, WebhookResponse};
use crate::processor::identifier::normalize_phone;
use crate::processor::threshold::ThresholdTable;
use crate::processor::{review, Processor};
use crate::value::Coercer;

pub struct VoiceProcessor {
    config: VoiceConfig,
    client: Arc<dyn CommunityClient>,
}

impl VoiceProcessor {
    pub fn new(config: VoiceConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn parse(body: &Coercer) -> VoiceMessage {
        let voice_analysis = body.object("voice_analysis").map(|a| VoiceAnalysis {
            sentiment_score: a.float("sentiment_score"),
            stress_level: a.float("stress_level"),
            speech_rate: a.float("speech_rate"),
            speaker_gender: a.string("speaker_gender"),
            estimated_age: a.int("estimated_age"),
            accent_region: a.string("accent_region"),
            background_noise: a.float("background_noise"),
            audio_quality: a.float("audio_quality"),
            voiceprint_id: a.string("voiceprint_id"),
            emotion_scores: Default::default(),
        });

        VoiceMessage {
            id: body.string("id"),
            from: body.string_or("from", ""),
            to: body.string("to"),
            call_sid: body.string("call_sid"),
            recording_url: body.string("recording_url"),
            recording_duration: body.float_or("recording_duration", 0.0),
            transcription: body.string("transcription"),
            confidence: body.float("confidence"),
            language: body.string("language"),
            audio_format: body.string("audio_format"),
            file_size: body.int_or("file_size", 0),
            direction: body.string("direction"),
            status: body.string("status"),
            country: body.string("country"),
            carrier: body.string("carrier"),
            voice_analysis,
            metadata: body.string_map("metadata"),
        }
    }
}

impl Clone for VoiceProcessor {
    fn clone(&self) -> Self {
        Self {
            config: VoiceConfig {
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
impl Processor for VoiceProcessor {
    fn tag(&self) -> &str {
        "voice"
    }

    fn description(&self) -> &str {
        "Normalizes and reviews inbound voice-call transcription webhooks."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let message = Self::parse(&body);

        if message.from.is_empty() {
            return WebhookResponse::err(&request.id, "voice message is missing a caller");
        }

        let from = normalize_phone(&message.from);

        if self.config.blocked_numbers.iter().any(|n| normalize_phone(n) == from) {
            let mut data = HashMap::new();
            data.insert("action".to_string(), json!("blocked"));
            data.insert("reason".to_string(), json!("blocked_number"));
            return WebhookResponse::ok(&request.id, format!("caller '{}' is blocked", message.from)).with_data(data);
        }

        let trusted = self.config.trusted_numbers.iter().any(|n| normalize_phone(n) == from);
        let thresholds = if trusted { &ThresholdTable::TRUSTED } else { &ThresholdTable::DEFAULT };

        let Some(transcription) = message.transcription.filter(|t| !t.is_empty()) else {
            return WebhookResponse::err(&request.id, "voice message has no transcription to review");
        };

        review::review_and_respond(self.client.as_ref(), &self.config.community_topic, &self.config.policy, thresholds, &request.id, &transcription)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use serde_json::json;

    fn processor() -> VoiceProcessor {
        VoiceProcessor::new(VoiceConfig::default(), Arc::new(StubCommunityClient::new()))
    }

    fn processor_with(config: VoiceConfig) -> VoiceProcessor {
        VoiceProcessor::new(config, Arc::new(StubCommunityClient::new()))
    }

    #[tokio::test]
    async fn missing_transcription_is_rejected() {
        let p = processor();
        let req = WebhookRequest::new(
            "req_1".to_string(),
            "voice".to_string(),
            "voice".to_string(),
            Default::default(),
            json!({"from": "+15550001111"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(!resp.success);
        assert!(resp.message.contains("transcription"));
    }

    #[tokio::test]
    async fn transcription_is_reviewed() {
        let p = processor();
        let req = WebhookRequest::new(
            "req_2".to_string(),
            "voice".to_string(),
            "voice".to_string(),
            Default::default(),
            json!({"from": "+15550001111", "transcription": "hi, just checking in"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
    }

    #[tokio::test]
    async fn blocked_caller_is_rejected_without_review() {
        let mut config = VoiceConfig::default();
        config.blocked_numbers.push("+15551234567".to_string());
        let p = processor_with(config);
        let req = WebhookRequest::new(
            "req_3".to_string(),
            "voice".to_string(),
            "voice".to_string(),
            Default::default(),
            json!({"from": "15551234567", "transcription": "hi"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap().get("action").unwrap(), &json!("blocked"));
    }

    #[tokio::test]
    async fn trusted_caller_proceeds_through_review() {
        let mut config = VoiceConfig::default();
        config.trusted_numbers.push("+15550001111".to_string());
        let p = processor_with(config);
        let req = WebhookRequest::new(
            "req_4".to_string(),
            "voice".to_string(),
            "voice".to_string(),
            Default::default(),
            json!({"from": "+15550001111", "transcription": "hi, just checking in"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        assert!(resp.data.unwrap().contains_key("threat_level"));
    }
}
