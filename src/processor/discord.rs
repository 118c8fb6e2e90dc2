//! Discord channel processor (§4.3, §6). Normalizes a Discord message
//! webhook body, applies a keyword filter before spending a review cycle,
//! and otherwise defers to the shared community-review pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ai::CommunityClient;
use crate::config::DiscordConfig;
use crate::model::{DiscordAttachment, DiscordAuthor, DiscordEmbed, DiscordMessage, WebhookRequest, WebhookResponse};
use crate::processor::threshold::ThresholdTable;
use crate::processor::{review, Processor};
use crate::value::Coercer;

/// Content filter tokens (§4.3, §8 invariant): fixed, not configurable —
/// the invariant requires EXACTLY these tokens to trigger filtering.
const FILTERED_KEYWORDS: [&str; 5] = ["spam", "abuse", "harmful", "toxic", "hate"];

const SECURITY_KEYWORDS: [&str; 3] = ["security", "vulnerability", "eval("];
const ALGORITHM_KEYWORDS: [&str; 6] = ["algorithm", "performance", "optimization", "complexity", "o(n", "scalability"];
const CONSCIOUSNESS_KEYWORDS: [&str; 7] =
    ["consciousness", "awareness", "emergent", "cognitive architecture", "self-awareness", "subjective experience", "ai personas"];

pub struct DiscordProcessor {
    config: DiscordConfig,
    client: Arc<dyn CommunityClient>,
}

impl DiscordProcessor {
    pub fn new(config: DiscordConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn parse(body: &Coercer) -> DiscordMessage {
        let author = body.object("author").map(|a| DiscordAuthor {
            id: a.string("id"),
            username: a.string("username"),
            avatar: a.string("avatar"),
            bot: a.bool_or("bot", false),
        });

        let attachments = body
            .array("attachments")
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| {
                        let c = Coercer::new(v);
                        c.str("url").map(|url| DiscordAttachment {
                            url: url.to_string(),
                            filename: c.string("filename"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let embeds = body
            .array("embeds")
            .map(|arr| {
                arr.iter()
                    .map(|v| {
                        let c = Coercer::new(v);
                        DiscordEmbed {
                            title: c.string("title"),
                            description: c.string("description"),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        DiscordMessage {
            content: body.string_or("content", ""),
            channel_id: body.string("channel_id"),
            guild_id: body.string("guild_id"),
            author,
            attachments,
            embeds,
        }
    }

    fn matches_filter_keyword(content: &str) -> Option<&'static str> {
        let lower = content.to_lowercase();
        FILTERED_KEYWORDS.iter().find(|kw| lower.contains(*kw)).copied()
    }

    /// Topic inference cascade (§4.3): code blocks plus "review" or a
    /// security keyword route to `code_review`; algorithm/performance
    /// language routes to `technical_discussion`; consciousness language
    /// routes to `ai_consciousness`; any other code indicator still counts
    /// as `technical_discussion`; everything else is `general_discussion`.
    fn infer_topic(content: &str) -> &'static str {
        let lower = content.to_lowercase();
        let has_code_block = content.contains("```");

        if has_code_block && lower.contains("review") {
            return "code_review";
        }
        if has_code_block && SECURITY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return "code_review";
        }
        if ALGORITHM_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return "technical_discussion";
        }
        if CONSCIOUSNESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return "ai_consciousness";
        }
        if has_code_block {
            return "technical_discussion";
        }
        "general_discussion"
    }

    /// Discord's own verdict scale (§4.3): coarser than the shared
    /// `ThreatLevel` table and surfaced as `data.action` rather than
    /// `data.threat_level`.
    fn verdict(overall_score: f64) -> &'static str {
        if overall_score >= 0.8 {
            "approve"
        } else if overall_score >= 0.6 {
            "review_required"
        } else if overall_score >= 0.4 {
            "flag_for_attention"
        } else {
            "reject"
        }
    }
}

impl Clone for DiscordProcessor {
    fn clone(&self) -> Self {
        Self {
            config: DiscordConfig {
                policy: self.config.policy.clone(),
                community_topic: self.config.community_topic.clone(),
                enable_sentiment: self.config.enable_sentiment,
                filter_keywords: self.config.filter_keywords.clone(),
            },
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl Processor for DiscordProcessor {
    fn tag(&self) -> &str {
        "discord"
    }

    fn description(&self) -> &str {
        "Normalizes and reviews inbound Discord message webhooks."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let message = Self::parse(&body);

        if message.content.is_empty() && message.attachments.is_empty() {
            return WebhookResponse::err(&request.id, "discord message has no content or attachments");
        }

        if let Some(keyword) = Self::matches_filter_keyword(&message.content) {
            let mut data = HashMap::new();
            data.insert("action".to_string(), json!("filtered"));
            data.insert("reason".to_string(), json!("content_filter"));
            data.insert("matched_keyword".to_string(), json!(keyword));
            return WebhookResponse::ok(&request.id, format!("message filtered: matched keyword '{keyword}'")).with_data(data);
        }

        let topic = Self::infer_topic(&message.content);
        let mut response =
            review::review_and_respond(self.client.as_ref(), topic, &self.config.policy, &ThresholdTable::DEFAULT, &request.id, &message.content)
                .await;

        if response.success {
            if let Some(score) = response.data.as_ref().and_then(|d| d.get("overall_score")).and_then(|v| v.as_f64()) {
                let mut data = response.data.take().unwrap_or_default();
                data.insert("action".to_string(), json!(Self::verdict(score)));
                response = response.with_data(data);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;
    use serde_json::json;

    fn processor() -> DiscordProcessor {
        DiscordProcessor::new(DiscordConfig::default(), Arc::new(StubCommunityClient::new()))
    }

    #[tokio::test]
    async fn benign_message_is_reviewed() {
        let p = processor();
        let req = WebhookRequest::new(
            "req_1".to_string(),
            "discord".to_string(),
            "discord".to_string(),
            Default::default(),
            json!({"content": "anyone up for game night?"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
    }

    #[tokio::test]
    async fn filtered_keyword_short_circuits_before_review() {
        let p = processor();
        let req = WebhookRequest::new(
            "req_2".to_string(),
            "discord".to_string(),
            "discord".to_string(),
            Default::default(),
            json!({"content": "this is spam content"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data.get("action").unwrap(), &json!("filtered"));
        assert_eq!(data.get("reason").unwrap(), &json!("content_filter"));
    }

    #[tokio::test]
    async fn non_filtered_keyword_is_not_blocked() {
        let p = processor();
        let req = WebhookRequest::new(
            "req_2b".to_string(),
            "discord".to_string(),
            "discord".to_string(),
            Default::default(),
            json!({"content": "let's ship this feature"}),
        );
        let resp = p.process_webhook(req).await;
        assert!(resp.success);
        assert!(resp.data.unwrap().get("action").unwrap() != &json!("filtered"));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let p = processor();
        let req = WebhookRequest::new(
            "req_3".to_string(),
            "discord".to_string(),
            "discord".to_string(),
            Default::default(),
            json!({}),
        );
        let resp = p.process_webhook(req).await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn code_block_alone_infers_technical_discussion() {
        assert_eq!(DiscordProcessor::infer_topic("```fn main() {}```"), "technical_discussion");
    }

    #[tokio::test]
    async fn code_block_with_review_infers_code_review() {
        assert_eq!(DiscordProcessor::infer_topic("```fn main() {}``` please review"), "code_review");
    }

    #[tokio::test]
    async fn consciousness_language_infers_ai_consciousness() {
        assert_eq!(DiscordProcessor::infer_topic("thoughts on machine consciousness?"), "ai_consciousness");
    }

    #[tokio::test]
    async fn plain_chatter_infers_general_discussion() {
        assert_eq!(DiscordProcessor::infer_topic("anyone up for game night?"), "general_discussion");
    }
}
