use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Sms,
    Voice,
    Irc,
    Discord,
    Email,
    Sdcard,
}

impl InputType {
    pub fn parse(s: &str) -> Option<InputType> {
        Some(match s.to_lowercase().as_str() {
            "sms" => InputType::Sms,
            "voice" => InputType::Voice,
            "irc" => InputType::Irc,
            "discord" => InputType::Discord,
            "email" => InputType::Email,
            "sdcard" => InputType::Sdcard,
            _ => return None,
        })
    }
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InputType::Sms => "sms",
            InputType::Voice => "voice",
            InputType::Irc => "irc",
            InputType::Discord => "discord",
            InputType::Email => "email",
            InputType::Sdcard => "sdcard",
        };
        write!(f, "{s}")
    }
}

/// Canonical normalized message, independent of the transport it arrived on
/// (§3). `id` is unique within the process lifetime (§8 invariant).
#[derive(Debug, Clone, Serialize)]
pub struct InputEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InputType,
    pub source: String,
    pub content: String,
    pub metadata: HashMap<String, Json>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub priority: u32,
}

impl InputEvent {
    pub fn new(kind: InputType, source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: crate::ids::event_id(),
            kind,
            source: source.into(),
            content: content.into(),
            metadata: HashMap::new(),
            timestamp: chrono::Utc::now(),
            priority: 0,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Json) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// Outbound reply generated by the bidirectional IO-bus processor for an
/// inbound `InputEvent` (§4.3): one command per channel that can actually
/// receive a reply (sms, voice, irc, discord — email and sdcard cannot).
#[derive(Debug, Clone, Serialize)]
pub struct OutputCommand {
    pub id: String,
    pub channel: InputType,
    pub target: String,
    pub content: String,
}

impl OutputCommand {
    pub fn new(channel: InputType, target: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: crate::ids::event_id(), channel, target: target.into(), content: content.into() }
    }
}

/// A single piece of evidence backing a `ThreatAnalysisResult` (§4.3).
#[derive(Debug, Clone, Serialize)]
pub struct ThreatIndicator {
    pub category: String,
    pub confidence: f64,
}

/// Deterministic, keyword-driven threat read on an `InputEvent`'s content,
/// distinct from the AI-community consensus the other five channels submit
/// for (§4.3's Fr0gIO paragraph runs no community review at all).
#[derive(Debug, Clone, Serialize)]
pub struct ThreatAnalysisResult {
    pub threat_level: crate::model::ThreatLevel,
    pub score: f64,
    pub tags: Vec<String>,
    pub indicators: Vec<ThreatIndicator>,
    pub mitigation: Vec<String>,
}
