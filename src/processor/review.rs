//! Shared review pipeline used by every channel processor once its own
//! allow/deny policy has let a message through: spin up an ephemeral
//! community, submit the content, and translate the consensus into a
//! `WebhookResponse`. Kept as one function because all six channels need
//! the exact same create→submit→threshold shape (§4.3); only the content
//! string and topic differ per channel.

use std::collections::HashMap;

use serde_json::json;

use crate::ai::CommunityClient;
use crate::config::ReviewPolicy;
use crate::model::{ThreatLevel, WebhookResponse};
use crate::processor::threshold::ThresholdTable;

/// Runs the community review pipeline and folds the result into a response.
/// `agreement < policy.required_consensus` doesn't fail the request — it
/// downgrades the verdict to "needs manual review" per the design note that
/// low agreement should route to a human rather than silently pass or block.
///
/// `thresholds` is the caller's severity table (§4.3 step 6) — the stricter
/// `ThresholdTable::TRUSTED` for a trusted identifier, `ThresholdTable::DEFAULT`
/// otherwise. A review with no consensus (the client never populated one)
/// yields `ThreatLevel::Unknown` rather than treating a missing score as zero.
pub async fn review_and_respond(
    client: &dyn CommunityClient,
    topic: &str,
    policy: &ReviewPolicy,
    thresholds: &ThresholdTable,
    request_id: &str,
    content: &str,
) -> WebhookResponse {
    let community = match client.create_community(topic, policy.persona_count).await {
        Ok(c) => c,
        Err(e) => {
            return WebhookResponse::err(request_id, format!("community creation failed: {e}"));
        }
    };

    let review = match client.submit_for_review(&community.id, content).await {
        Ok(r) => r,
        Err(e) => {
            return WebhookResponse::err(request_id, format!("community review failed: {e}"));
        }
    };

    let threat_level = match &review.consensus {
        Some(consensus) => thresholds.derive(consensus.overall_score),
        None => ThreatLevel::Unknown,
    };
    let consensus = review.consensus.clone().unwrap_or_default();
    let needs_manual_review = consensus.agreement < policy.required_consensus;

    let mut data = HashMap::new();
    data.insert("review_id".to_string(), json!(review.review_id));
    data.insert("threat_level".to_string(), json!(threat_level.to_string()));
    data.insert("overall_score".to_string(), json!(consensus.overall_score));
    data.insert("agreement".to_string(), json!(consensus.agreement));
    data.insert("confidence_level".to_string(), json!(consensus.confidence_level));
    data.insert("recommendation".to_string(), json!(consensus.recommendation));
    data.insert("needs_manual_review".to_string(), json!(needs_manual_review));

    let message = if needs_manual_review {
        format!("reviewed with low reviewer agreement ({:.2}); flagged for manual review", consensus.agreement)
    } else {
        "reviewed by community".to_string()
    };

    WebhookResponse::ok(request_id, message).with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubCommunityClient;

    fn policy() -> ReviewPolicy {
        ReviewPolicy {
            persona_count: 2,
            review_timeout_ms: 5_000,
            required_consensus: 0.6,
        }
    }

    #[tokio::test]
    async fn benign_content_is_not_flagged() {
        let client = StubCommunityClient::new();
        let resp =
            review_and_respond(&client, "general_discussion", &policy(), &ThresholdTable::DEFAULT, "req_1", "Nice work on the release.")
                .await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data.get("needs_manual_review").unwrap(), &json!(false));
        assert!(data.contains_key("threat_level"));
    }

    #[tokio::test]
    async fn low_agreement_is_flagged_for_manual_review() {
        let client = StubCommunityClient::new();
        let mut strict_policy = policy();
        strict_policy.required_consensus = 1.0;
        let resp = review_and_respond(
            &client,
            "general_discussion",
            &strict_policy,
            &ThresholdTable::DEFAULT,
            "req_2",
            "Some ambiguous message",
        )
        .await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data.get("needs_manual_review").unwrap(), &json!(true));
    }

    #[tokio::test]
    async fn threat_level_reflects_the_chosen_table_at_a_known_score() {
        // Four red-flag hits against the stub's scoring heuristic lands
        // overall_score at 0.40 exactly: Low under the default table (low
        // bound 0.4), Minimal under the trusted table (low bound 0.5).
        let client = StubCommunityClient::new();
        let content = "urgent wire transfer, password reset, malware warning";
        let default_resp = review_and_respond(&client, "general_discussion", &policy(), &ThresholdTable::DEFAULT, "req_3", content).await;
        let trusted_resp = review_and_respond(&client, "general_discussion", &policy(), &ThresholdTable::TRUSTED, "req_4", content).await;

        let default_data = default_resp.data.unwrap();
        let trusted_data = trusted_resp.data.unwrap();
        let score = default_data.get("overall_score").unwrap().as_f64().unwrap();
        assert!((score - 0.40).abs() < 1e-9);
        assert_eq!(default_data.get("threat_level").unwrap(), &json!("low"));
        assert_eq!(trusted_data.get("threat_level").unwrap(), &json!("minimal"));
    }
}
