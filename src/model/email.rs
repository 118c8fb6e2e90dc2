use std::collections::HashMap;

use serde::Serialize;

use super::ThreatLevel;

#[derive(Debug, Clone, Serialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub hash: String,
}

/// The canonical email vector produced at DATA-finalize by the ESMTP
/// interceptor (§3/§4.2), and by the ESMTP webhook-variant processor (§4.3).
#[derive(Debug, Clone, Serialize)]
pub struct EmailThreatVector {
    pub id: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub attachments: Vec<EmailAttachment>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub threat_level: ThreatLevel,
    pub source: &'static str,
}

impl EmailThreatVector {
    pub fn new(
        from: String,
        to: Vec<String>,
        subject: String,
        body: String,
        headers: HashMap<String, String>,
        attachments: Vec<EmailAttachment>,
    ) -> Self {
        Self {
            id: crate::ids::event_id(),
            from,
            to,
            subject,
            body,
            headers,
            attachments,
            timestamp: chrono::Utc::now(),
            threat_level: ThreatLevel::Unknown,
            source: "esmtp",
        }
    }
}
