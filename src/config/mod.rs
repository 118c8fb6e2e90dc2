//! Configuration layer (§6, SPEC_FULL §4.8). TOML-backed, `serde`-deserialized,
//! the same shape as the teacher's `config::Config::from_file`.

use anyhow::{Context, Result};
use serde::Deserialize;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub esmtp: EsmtpConfig,
    #[serde(default)]
    pub processors: ProcessorsConfig,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {path}"))?;
        toml::from_str(&content).context("failed to parse config file")
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CommonConfig {
    pub core_threads: Option<usize>,
}

fn default_bus_host() -> String {
    "0.0.0.0".to_string()
}
fn default_bus_port() -> u16 {
    8080
}
fn default_max_request_size() -> usize {
    1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    #[serde(default = "default_bus_host")]
    pub host: String,
    #[serde(default = "default_bus_port")]
    pub port: u16,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: default_bus_host(),
            port: default_bus_port(),
            max_request_size: default_max_request_size(),
            enable_logging: true,
            allowed_origins: Vec::new(),
        }
    }
}

fn default_esmtp_host() -> String {
    "0.0.0.0".to_string()
}
fn default_esmtp_port() -> u16 {
    2525
}
fn default_hostname() -> String {
    "sentrybus".to_string()
}
fn default_max_message_size() -> usize {
    10 * 1024 * 1024
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_persona_count() -> usize {
    3
}
fn default_review_timeout_ms() -> u64 {
    10_000
}
fn default_required_consensus() -> f64 {
    0.6
}
fn default_topic(name: &str) -> String {
    name.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EsmtpConfig {
    #[serde(default = "default_esmtp_host")]
    pub host: String,
    #[serde(default = "default_esmtp_port")]
    pub port: u16,
    pub tls_port: Option<u16>,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub enable_tls: bool,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    #[serde(default = "default_email_topic")]
    pub community_topic: String,
    #[serde(default = "default_persona_count")]
    pub persona_count: usize,
    #[serde(default = "default_review_timeout_ms")]
    pub review_timeout_ms: u64,
    #[serde(default = "default_required_consensus")]
    pub required_consensus: f64,
}

fn default_email_topic() -> String {
    default_topic("email_threat_analysis")
}

impl Default for EsmtpConfig {
    fn default() -> Self {
        Self {
            host: default_esmtp_host(),
            port: default_esmtp_port(),
            tls_port: None,
            hostname: default_hostname(),
            max_message_size: default_max_message_size(),
            timeout_secs: default_timeout_secs(),
            enable_tls: false,
            cert_file: None,
            key_file: None,
            community_topic: default_email_topic(),
            persona_count: default_persona_count(),
            review_timeout_ms: default_review_timeout_ms(),
            required_consensus: default_required_consensus(),
        }
    }
}

/// Shared fields every channel processor's config carries (§6).
#[derive(Debug, Deserialize, Clone)]
pub struct ReviewPolicy {
    #[serde(default = "default_persona_count")]
    pub persona_count: usize,
    #[serde(default = "default_review_timeout_ms")]
    pub review_timeout_ms: u64,
    #[serde(default = "default_required_consensus")]
    pub required_consensus: f64,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            persona_count: default_persona_count(),
            review_timeout_ms: default_review_timeout_ms(),
            required_consensus: default_required_consensus(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProcessorsConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub irc: IrcConfig,
    #[serde(default)]
    pub sdcard: SdCardConfig,
    #[serde(default)]
    pub io_bus: IoBusConfig,
}

fn default_discord_topic() -> String {
    default_topic("general_discussion")
}
fn default_sms_topic() -> String {
    default_topic("sms_threat_analysis")
}
fn default_voice_topic() -> String {
    default_topic("voice_threat_analysis")
}
fn default_irc_topic() -> String {
    default_topic("irc_threat_analysis")
}
fn default_sdcard_topic() -> String {
    default_topic("sdcard_threat_analysis")
}
fn default_io_bus_topic() -> String {
    default_topic("io_bus_analysis")
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    #[serde(flatten)]
    pub policy: ReviewPolicy,
    #[serde(default = "default_discord_topic")]
    pub community_topic: String,
    #[serde(default)]
    pub enable_sentiment: bool,
    #[serde(default = "default_discord_filter_keywords")]
    pub filter_keywords: Vec<String>,
}

fn default_discord_filter_keywords() -> Vec<String> {
    ["spam", "abuse", "harmful", "toxic", "hate"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::default(),
            community_topic: default_discord_topic(),
            enable_sentiment: false,
            filter_keywords: default_discord_filter_keywords(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmsConfig {
    #[serde(flatten)]
    pub policy: ReviewPolicy,
    #[serde(default = "default_sms_topic")]
    pub community_topic: String,
    #[serde(default)]
    pub trusted_numbers: Vec<String>,
    #[serde(default)]
    pub blocked_numbers: Vec<String>,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::default(),
            community_topic: default_sms_topic(),
            trusted_numbers: Vec::new(),
            blocked_numbers: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VoiceConfig {
    #[serde(flatten)]
    pub policy: ReviewPolicy,
    #[serde(default = "default_voice_topic")]
    pub community_topic: String,
    #[serde(default)]
    pub trusted_numbers: Vec<String>,
    #[serde(default)]
    pub blocked_numbers: Vec<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::default(),
            community_topic: default_voice_topic(),
            trusted_numbers: Vec::new(),
            blocked_numbers: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IrcConfig {
    #[serde(flatten)]
    pub policy: ReviewPolicy,
    #[serde(default = "default_irc_topic")]
    pub community_topic: String,
    #[serde(default)]
    pub trusted_nicks: Vec<String>,
    #[serde(default)]
    pub ignored_nicks: Vec<String>,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::default(),
            community_topic: default_irc_topic(),
            trusted_nicks: Vec::new(),
            ignored_nicks: Vec::new(),
        }
    }
}

fn default_blocked_extensions() -> Vec<String> {
    [".exe", ".bat", ".cmd", ".scr", ".vbs", ".ps1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct SdCardConfig {
    #[serde(flatten)]
    pub policy: ReviewPolicy,
    #[serde(default = "default_sdcard_topic")]
    pub community_topic: String,
    #[serde(default)]
    pub hash_files: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
}

impl Default for SdCardConfig {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::default(),
            community_topic: default_sdcard_topic(),
            hash_files: false,
            max_file_size: default_max_file_size(),
            blocked_extensions: default_blocked_extensions(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IoBusConfig {
    #[serde(flatten)]
    pub policy: ReviewPolicy,
    #[serde(default = "default_io_bus_topic")]
    pub community_topic: String,
}

impl Default for IoBusConfig {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::default(),
            community_topic: default_io_bus_topic(),
        }
    }
}
