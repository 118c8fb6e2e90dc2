//! Deterministic threat scan applied to Fr0gIO `input_event` content (§4.3).
//! Unlike the other five channels this never calls the AI community client —
//! it is a fixed keyword/length/URL rule set.

use crate::model::{ThreatAnalysisResult, ThreatIndicator, ThreatLevel};

const HACK_KEYWORDS: [&str; 2] = ["hack", "attack"];
const MALWARE_KEYWORDS: [&str; 2] = ["malware", "virus"];
const TRIGGER_KEYWORDS: [&str; 6] = ["hack", "attack", "malware", "virus", "exploit", "breach"];
const URL_MARKERS: [&str; 3] = ["http://", "https://", "www."];
const MAX_BENIGN_LENGTH: usize = 1000;

fn contains_any(lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| lower.contains(n))
}

/// Returns `None` when none of the trigger conditions hold; otherwise a
/// result whose level/score escalate with the worst keyword category
/// matched and whose indicators/mitigation are fixed.
pub fn analyze(content: &str) -> Option<ThreatAnalysisResult> {
    let lower = content.to_lowercase();
    let has_url = contains_any(&lower, &URL_MARKERS);
    let triggered = contains_any(&lower, &TRIGGER_KEYWORDS) || content.len() > MAX_BENIGN_LENGTH || has_url;
    if !triggered {
        return None;
    }

    let mut threat_level = ThreatLevel::Low;
    let mut score: f64 = 0.1;
    let mut tags = Vec::new();

    if contains_any(&lower, &HACK_KEYWORDS) {
        threat_level = ThreatLevel::Medium;
        score = 0.5;
        tags.push("potential_attack".to_string());
    }
    if contains_any(&lower, &MALWARE_KEYWORDS) {
        threat_level = ThreatLevel::High;
        score = 0.8;
        tags.push("malware_reference".to_string());
    }
    if has_url {
        score += 0.2;
        tags.push("suspicious_url".to_string());
    }
    score = score.min(1.0);

    Some(ThreatAnalysisResult {
        threat_level,
        score,
        tags,
        indicators: vec![ThreatIndicator { category: "content_analysis/suspicious_keywords".to_string(), confidence: 0.7 }],
        mitigation: vec![
            "Increase monitoring on this source for the next reporting cycle.".to_string(),
            "Log this event for review in the next incident triage.".to_string(),
        ],
    })
}
