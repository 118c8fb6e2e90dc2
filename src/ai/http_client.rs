//! HTTP-backed `CommunityClient` (§4.5, production transport). Grounded on
//! the teacher's `WebhookProcessor`, which posted outbound JSON via a shared
//! `reqwest::Client` and mapped non-2xx responses into its processor error
//! type; this client does the same against a community-review backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::{CommunityClient, CommunityError};
use crate::model::{Community, CommunityReview, PersonaInfo};

#[derive(Debug, Serialize)]
struct CreateCommunityRequest<'a> {
    topic: &'a str,
    persona_count: usize,
}

#[derive(Debug, Serialize)]
struct SubmitReviewRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Talks to a remote community-review backend over HTTP. The base URL is
/// expected to expose `POST /communities`, `POST /communities/{id}/reviews`,
/// `GET /reviews/{id}`, and `GET /communities/{id}/members`.
pub struct HttpCommunityClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCommunityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client with static config builds");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn error_for_status(resp: reqwest::Response, context: &str) -> CommunityError {
        let status = resp.status();
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        CommunityError::SubmissionError(format!("{context}: {status} {message}"))
    }
}

#[async_trait::async_trait]
impl CommunityClient for HttpCommunityClient {
    async fn create_community(&self, topic: &str, persona_count: usize) -> Result<Community, CommunityError> {
        let url = format!("{}/communities", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&CreateCommunityRequest { topic, persona_count })
            .send()
            .await
            .map_err(|e| CommunityError::CreationError(e.to_string()))?;

        if !resp.status().is_success() {
            let err = Self::error_for_status(resp, "create_community").await;
            return Err(CommunityError::CreationError(err.to_string()));
        }

        resp.json::<Community>()
            .await
            .map_err(|e| CommunityError::CreationError(format!("invalid response body: {e}")))
    }

    async fn submit_for_review(&self, community_id: &str, content: &str) -> Result<CommunityReview, CommunityError> {
        let url = format!("{}/communities/{community_id}/reviews", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SubmitReviewRequest { content })
            .send()
            .await
            .map_err(|e| CommunityError::SubmissionError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::error_for_status(resp, "submit_for_review").await);
        }

        resp.json::<CommunityReview>()
            .await
            .map_err(|e| CommunityError::SubmissionError(format!("invalid response body: {e}")))
    }

    async fn get_review_status(&self, review_id: &str) -> Result<CommunityReview, CommunityError> {
        let url = format!("{}/reviews/{review_id}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CommunityError::NotFound(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CommunityError::NotFound(format!("no review with id {review_id}")));
        }
        if !resp.status().is_success() {
            return Err(Self::error_for_status(resp, "get_review_status").await);
        }

        resp.json::<CommunityReview>()
            .await
            .map_err(|e| CommunityError::NotFound(format!("invalid response body: {e}")))
    }

    async fn get_community_members(&self, community_id: &str) -> Result<Vec<PersonaInfo>, CommunityError> {
        let url = format!("{}/communities/{community_id}/members", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CommunityError::NotFound(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CommunityError::NotFound(format!("no community with id {community_id}")));
        }
        if !resp.status().is_success() {
            return Err(Self::error_for_status(resp, "get_community_members").await);
        }

        resp.json::<Vec<PersonaInfo>>()
            .await
            .map_err(|e| CommunityError::NotFound(format!("invalid response body: {e}")))
    }
}
