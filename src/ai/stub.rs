//! Deterministic in-memory `CommunityClient` (§4.10 test tooling). Scores
//! content with a small heuristic so the same input always produces the
//! same consensus, keeping integration tests stable without a network call.
//! Grounded on the teacher's `WebhookProcessor`'s pattern of holding a
//! `dashmap`-backed registry behind a cloneable handle.

use chrono::Utc;
use dashmap::DashMap;

use crate::ai::{consensus, personas, CommunityClient, CommunityError};
use crate::ids;
use crate::model::{Community, CommunityReview, CommunityStatus, PersonaInfo, PersonaReview};

struct CommunityRecord {
    topic: String,
    members: Vec<PersonaInfo>,
}

/// Deterministic stand-in for a hosted community review backend. Holds
/// created communities and completed reviews in memory; nothing survives
/// process restart, which is the point — tests want a clean slate per run.
#[derive(Default)]
pub struct StubCommunityClient {
    communities: DashMap<String, CommunityRecord>,
    reviews: DashMap<String, CommunityReview>,
    /// When set, `submit_for_review` fails for content containing this
    /// substring. Lets tests exercise the `SubmissionError` path without a
    /// real backend to break.
    fail_on_substring: Option<String>,
}

impl StubCommunityClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_trigger(substring: impl Into<String>) -> Self {
        Self {
            fail_on_substring: Some(substring.into()),
            ..Self::default()
        }
    }

    /// Cheap content-derived score in `[0.0, 1.0]`: starts neutral, and
    /// drops for each suspicious keyword found. Stable across calls because
    /// it is a pure function of `content`.
    fn score_content(content: &str) -> f64 {
        const RED_FLAGS: &[&str] = &[
            "urgent", "wire transfer", "password", "click here", "verify your account",
            "malware", "exploit", "bitcoin", "gift card", "suspended",
        ];
        let lower = content.to_lowercase();
        let hits = RED_FLAGS.iter().filter(|flag| lower.contains(*flag)).count();
        (1.0 - (hits as f64 * 0.15)).clamp(0.05, 1.0)
    }

    fn tags_for(content: &str) -> Vec<String> {
        let lower = content.to_lowercase();
        let mut tags = Vec::new();
        if lower.contains("password") || lower.contains("verify your account") {
            tags.push("credential_harvesting".to_string());
        }
        if lower.contains("wire transfer") || lower.contains("gift card") || lower.contains("bitcoin") {
            tags.push("financial_fraud".to_string());
        }
        if lower.contains("urgent") || lower.contains("suspended") {
            tags.push("urgency_pressure".to_string());
        }
        if lower.contains("malware") || lower.contains("exploit") {
            tags.push("malicious_payload".to_string());
        }
        tags
    }
}

#[async_trait::async_trait]
impl CommunityClient for StubCommunityClient {
    async fn create_community(&self, topic: &str, persona_count: usize) -> Result<Community, CommunityError> {
        if persona_count == 0 {
            return Err(CommunityError::CreationError("persona_count must be at least 1".to_string()));
        }

        let members = personas::build_members(topic, persona_count);
        let id = ids::community_id();
        self.communities.insert(
            id.clone(),
            CommunityRecord {
                topic: topic.to_string(),
                members: members.clone(),
            },
        );

        Ok(Community {
            id,
            topic: topic.to_string(),
            members,
            created_at: Utc::now(),
            status: CommunityStatus::Active,
        })
    }

    async fn submit_for_review(&self, community_id: &str, content: &str) -> Result<CommunityReview, CommunityError> {
        if let Some(trigger) = &self.fail_on_substring {
            if content.contains(trigger.as_str()) {
                return Err(CommunityError::SubmissionError(format!(
                    "backend rejected content for community {community_id}"
                )));
            }
        }

        let record = self
            .communities
            .get(community_id)
            .ok_or_else(|| CommunityError::NotFound(format!("no community with id {community_id}")))?;

        let base_score = Self::score_content(content);
        let tags = Self::tags_for(content);

        let persona_reviews: Vec<PersonaReview> = record
            .members
            .iter()
            .enumerate()
            .map(|(i, persona)| {
                // Small, deterministic per-persona jitter keeps scores from
                // being perfectly identical (which would make every review
                // "unanimous" and hide the dissent/key-point logic in tests).
                let jitter = ((i as f64) * 0.03) - 0.015 * (record.members.len() as f64 - 1.0);
                let score = (base_score + jitter).clamp(0.0, 1.0);
                PersonaReview {
                    persona_id: persona.id.clone(),
                    persona_name: persona.name.clone(),
                    expertise: persona.expertise.clone(),
                    review: format!("{} assessed the content as {:.2} on this batch's scale.", persona.name, score),
                    score,
                    confidence: 0.75,
                    tags: tags.clone(),
                    metadata: Default::default(),
                    timestamp: Utc::now(),
                }
            })
            .collect();

        let computed = consensus::compute(&persona_reviews);
        let review_id = ids::review_id();

        let review = CommunityReview {
            review_id: review_id.clone(),
            topic: record.topic.clone(),
            content: content.to_string(),
            persona_reviews,
            consensus: Some(computed.clone()),
            sentiment: None,
            recommendations: vec![computed.recommendation.clone()],
            metadata: Default::default(),
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };

        self.reviews.insert(review_id, review.clone());
        Ok(review)
    }

    async fn get_review_status(&self, review_id: &str) -> Result<CommunityReview, CommunityError> {
        self.reviews
            .get(review_id)
            .map(|r| r.clone())
            .ok_or_else(|| CommunityError::NotFound(format!("no review with id {review_id}")))
    }

    async fn get_community_members(&self, community_id: &str) -> Result<Vec<PersonaInfo>, CommunityError> {
        self.communities
            .get(community_id)
            .map(|c| c.members.clone())
            .ok_or_else(|| CommunityError::NotFound(format!("no community with id {community_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_submit_returns_completed_review() {
        let client = StubCommunityClient::new();
        let community = client.create_community("email_threat_analysis", 3).await.unwrap();
        assert_eq!(community.members.len(), 3);

        let review = client
            .submit_for_review(&community.id, "Please wire transfer funds urgently, verify your account now.")
            .await
            .unwrap();

        assert!(review.is_complete());
        assert_eq!(review.persona_reviews.len(), 3);
        let consensus = review.consensus.unwrap();
        assert!(consensus.overall_score < 0.6);
    }

    #[tokio::test]
    async fn benign_content_scores_high() {
        let client = StubCommunityClient::new();
        let community = client.create_community("general_discussion", 2).await.unwrap();
        let review = client
            .submit_for_review(&community.id, "Thanks for the update, looking forward to the release notes.")
            .await
            .unwrap();
        let consensus = review.consensus.unwrap();
        assert!(consensus.overall_score > 0.8);
    }

    #[tokio::test]
    async fn submit_for_unknown_community_fails() {
        let client = StubCommunityClient::new();
        let err = client.submit_for_review("nonexistent", "hi").await.unwrap_err();
        assert!(matches!(err, CommunityError::NotFound(_)));
    }

    #[tokio::test]
    async fn failure_trigger_forces_submission_error() {
        let client = StubCommunityClient::with_failure_trigger("TRIGGER_FAIL");
        let community = client.create_community("general_discussion", 2).await.unwrap();
        let err = client
            .submit_for_review(&community.id, "contains TRIGGER_FAIL marker")
            .await
            .unwrap_err();
        assert!(matches!(err, CommunityError::SubmissionError(_)));
    }

    #[tokio::test]
    async fn zero_persona_count_is_rejected() {
        let client = StubCommunityClient::new();
        let err = client.create_community("general_discussion", 0).await.unwrap_err();
        assert!(matches!(err, CommunityError::CreationError(_)));
    }
}
