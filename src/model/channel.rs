use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Serialize, Default)]
pub struct DiscordAuthor {
    pub id: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscordAttachment {
    pub url: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscordEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscordMessage {
    pub content: String,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub author: Option<DiscordAuthor>,
    pub attachments: Vec<DiscordAttachment>,
    pub embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmsMessage {
    pub id: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub body: String,
    pub message_sid: Option<String>,
    pub status: Option<String>,
    pub direction: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub carrier: Option<String>,
    pub message_type: Option<String>,
    pub media_urls: Vec<String>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceAnalysis {
    pub sentiment_score: Option<f64>,
    pub stress_level: Option<f64>,
    pub speech_rate: Option<f64>,
    pub speaker_gender: Option<String>,
    pub estimated_age: Option<i64>,
    pub accent_region: Option<String>,
    pub background_noise: Option<f64>,
    pub audio_quality: Option<f64>,
    pub voiceprint_id: Option<String>,
    pub emotion_scores: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceMessage {
    pub id: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub call_sid: Option<String>,
    pub recording_url: Option<String>,
    pub recording_duration: f64,
    pub transcription: Option<String>,
    pub confidence: Option<f64>,
    pub language: Option<String>,
    pub audio_format: Option<String>,
    pub file_size: i64,
    pub direction: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub carrier: Option<String>,
    pub voice_analysis: Option<VoiceAnalysis>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IrcUserInfo {
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub real_name: Option<String>,
    pub is_op: bool,
    pub is_voice: bool,
    pub idle_time: i64,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IrcMessage {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub message: String,
    pub channel: Option<String>,
    pub server: Option<String>,
    pub is_private: bool,
    pub user_info: Option<IrcUserInfo>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SdCardFile {
    pub path: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub mtime: Option<chrono::DateTime<chrono::Utc>>,
    pub permissions: String,
    pub is_hidden: bool,
    pub is_executable: bool,
    pub hash: Option<String>,
    pub content_snippet: Option<String>,
    pub threat_flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SdCardData {
    pub id: Option<String>,
    pub device_path: Option<String>,
    pub mount_point: Option<String>,
    pub file_system: Option<String>,
    pub total_size: i64,
    pub used_size: i64,
    pub files: Vec<SdCardFile>,
}
