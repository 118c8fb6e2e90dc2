//! Canonical data model (§3). These are plain data types — the transport
//! codecs (warp JSON, the ESMTP line parser) and the processors are the only
//! code allowed to construct them.

pub mod channel;
pub mod community;
pub mod email;
pub mod event;
pub mod webhook;

pub use channel::*;
pub use community::*;
pub use email::*;
pub use event::*;
pub use webhook::*;

use serde::{Deserialize, Serialize};

/// Threat level scale shared by the email vector and every channel
/// processor's verdict, from `unknown` (no consensus available) up through
/// `critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Unknown,
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ThreatLevel::Unknown => "unknown",
            ThreatLevel::Minimal => "minimal",
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}
