//! The AI Community Client contract (C3, §4.5) — the interface every
//! channel processor calls to assemble an ephemeral reviewer community,
//! submit content, and retrieve a consensus verdict.
//!
//! Two variants exist in the corpus this spec distills from (an HTTP-backed
//! client and a mock); per SPEC_FULL §4.10 this crate keeps the contract,
//! ships one production transport (`http_client::HttpCommunityClient`) and
//! one deterministic stub (`stub::StubCommunityClient`) that reproduces the
//! same consensus math so tests are portable between them.

pub mod consensus;
pub mod http_client;
pub mod personas;
pub mod stub;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Community, CommunityReview, PersonaInfo};

#[derive(Debug, Error)]
pub enum CommunityError {
    #[error("failed to create community: {0}")]
    CreationError(String),
    #[error("failed to submit for review: {0}")]
    SubmissionError(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// C3. Implementors must be `Send + Sync` and safe to share behind an `Arc`
/// across every processor (design note: "callers treat the client as
/// thread-safe").
#[async_trait]
pub trait CommunityClient: Send + Sync {
    async fn create_community(&self, topic: &str, persona_count: usize) -> Result<Community, CommunityError>;

    async fn submit_for_review(&self, community_id: &str, content: &str) -> Result<CommunityReview, CommunityError>;

    async fn get_review_status(&self, review_id: &str) -> Result<CommunityReview, CommunityError>;

    async fn get_community_members(&self, community_id: &str) -> Result<Vec<PersonaInfo>, CommunityError>;
}
