//! IRC channel processor (§4.3, §6). Ignored nicks are dropped silently
//! (acked, not reviewed); trusted nicks skip review; everyone else is
//! reviewed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ai::CommunityClient;
use crate::config::IrcConfig;
use crate::model::{IrcMessage, IrcUserInfo, WebhookRequest, WebhookResponse};
use crate::processor::threshold::ThresholdTable;
use crate::processor::{review, Processor};
use crate::value::Coercer;

pub struct IrcProcessor {
    config: IrcConfig,
    client: Arc<dyn CommunityClient>,
}

impl IrcProcessor {
    pub fn new(config: IrcConfig, client: Arc<dyn CommunityClient>) -> Self {
        Self { config, client }
    }

    fn parse(body: &Coercer) -> IrcMessage {
        let user_info = body.object("user_info").map(|u| IrcUserInfo {
            nickname: u.string("nickname"),
            username: u.string("username"),
            hostname: u.string("hostname"),
            real_name: u.string("real_name"),
            is_op: u.bool_or("is_op", false),
            is_voice: u.bool_or("is_voice", false),
            idle_time: u.int_or("idle_time", 0),
            channels: u.string_array("channels"),
        });

        IrcMessage {
            id: body.string("id"),
            kind: body.string("type"),
            from: body.string_or("from", ""),
            to: body.string("to"),
            message: body.string_or("message", ""),
            channel: body.string("channel"),
            server: body.string("server"),
            is_private: body.bool_or("is_private", false),
            user_info,
            metadata: body.string_map("metadata"),
        }
    }
}

impl Clone for IrcProcessor {
    fn clone(&self) -> Self {
        Self {
            config: IrcConfig {
                policy: self.config.policy.clone(),
                community_topic: self.config.community_topic.clone(),
                trusted_nicks: self.config.trusted_nicks.clone(),
                ignored_nicks: self.config.ignored_nicks.clone(),
            },
            client: self.client.clone(),
        }
    }
}

#[async_trait]
impl Processor for IrcProcessor {
    fn tag(&self) -> &str {
        "irc"
    }

    fn description(&self) -> &str {
        "Normalizes and reviews inbound IRC message webhooks."
    }

    async fn process_webhook(&self, request: WebhookRequest) -> WebhookResponse {
        let body = Coercer::new(&request.body);
        let message = Self::parse(&body);

        if message.from.is_empty() {
            return WebhookResponse::err(&request.id, "irc message is missing a sender nick");
        }

        let from = message.from.to_lowercase();

        if self.config.ignored_nicks.iter().any(|n| n.to_lowercase() == from) {
            let mut data = HashMap::new();
            data.insert("action".to_string(), json!("blocked"));
            data.insert("reason".to_string(), json!("ignored_nick"));
            return WebhookResponse::ok(&request.id, "sender is ignored, message dropped").with_data(data);
        }

        let trusted = self.config.trusted_nicks.iter().any(|n| n.to_lowercase() == from);
        let thresholds = if trusted { &ThresholdTable::TRUSTED } else { &ThresholdTable::DEFAULT };

        review::review_and_respond(self.client.as_ref(), &self.config.community_topic, &self.config.policy, thresholds, &request.id, &message.message)
            .await
    }
}
