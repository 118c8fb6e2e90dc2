use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityStatus {
    Active,
    Disbanded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaInfo {
    pub id: String,
    pub name: String,
    pub expertise: Vec<String>,
    pub description: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub topic: String,
    pub members: Vec<PersonaInfo>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub status: CommunityStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaReview {
    pub persona_id: String,
    pub persona_name: String,
    pub expertise: Vec<String>,
    pub review: String,
    pub score: f64,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Consensus {
    pub overall_score: f64,
    pub agreement: f64,
    pub recommendation: String,
    pub key_points: Vec<String>,
    pub dissenting: Vec<String>,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub overall: String,
    pub score: f64,
    pub emotions: HashMap<String, f64>,
    pub toxicity: f64,
    pub subjectivity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityReview {
    pub review_id: String,
    pub topic: String,
    pub content: String,
    pub persona_reviews: Vec<PersonaReview>,
    pub consensus: Option<Consensus>,
    pub sentiment: Option<Sentiment>,
    pub recommendations: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CommunityReview {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}
