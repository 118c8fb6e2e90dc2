//! Per-topic persona templates (§4.5). When a topic has a known template
//! table, members are drawn from it in declared order up to the requested
//! count; beyond that, additional members are synthesized by suffixing the
//! last template's name.

use crate::model::PersonaInfo;

#[derive(Debug, Clone, Copy)]
pub struct PersonaTemplate {
    pub name: &'static str,
    pub expertise: &'static [&'static str],
    pub description: &'static str,
    pub model: &'static str,
}

const GENERAL_DISCUSSION: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Generalist",
        expertise: &["general knowledge", "communication"],
        description: "Evaluates content for general appropriateness and clarity.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Moderator",
        expertise: &["community standards", "moderation"],
        description: "Checks content against community norms.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Context Keeper",
        expertise: &["context", "continuity"],
        description: "Weighs content against surrounding conversational context.",
        model: "community-reviewer-v1",
    },
];

const TECHNICAL_DISCUSSION: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Systems Engineer",
        expertise: &["algorithms", "performance", "scalability"],
        description: "Assesses technical accuracy and engineering soundness.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Complexity Analyst",
        expertise: &["complexity theory", "optimization"],
        description: "Checks claims about algorithmic complexity and performance.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Pragmatist",
        expertise: &["production engineering"],
        description: "Weighs whether the discussion holds up in practice.",
        model: "community-reviewer-v1",
    },
];

const AI_CONSCIOUSNESS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Cognitive Scientist",
        expertise: &["cognitive architecture", "consciousness studies"],
        description: "Evaluates claims about machine cognition and awareness.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Philosopher of Mind",
        expertise: &["subjective experience", "philosophy of mind"],
        description: "Examines claims of subjective experience for rigor.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Skeptic",
        expertise: &["falsifiability", "emergent behavior"],
        description: "Pressure-tests consciousness claims for overreach.",
        model: "community-reviewer-v1",
    },
];

const CODE_REVIEW: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Security Reviewer",
        expertise: &["security", "vulnerability analysis"],
        description: "Looks for unsafe patterns and injection risks in code blocks.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Style Reviewer",
        expertise: &["code style", "maintainability"],
        description: "Checks readability and idiomatic structure.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Correctness Reviewer",
        expertise: &["correctness", "testing"],
        description: "Assesses whether the code does what it claims to.",
        model: "community-reviewer-v1",
    },
];

const EMAIL_THREAT_ANALYSIS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Phishing Analyst",
        expertise: &["phishing", "social engineering"],
        description: "Looks for impersonation and credential-harvesting patterns.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Header Forensics Analyst",
        expertise: &["email headers", "spoofing"],
        description: "Checks header consistency for spoofing indicators.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Malware Analyst",
        expertise: &["attachments", "malware"],
        description: "Assesses attachment and link risk.",
        model: "community-reviewer-v1",
    },
];

const SMS_THREAT_ANALYSIS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Smishing Analyst",
        expertise: &["smishing", "social engineering"],
        description: "Looks for urgency/credential-harvesting patterns in SMS text.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Number Reputation Analyst",
        expertise: &["caller reputation", "spoofing"],
        description: "Weighs sender reputation and spoofing signals.",
        model: "community-reviewer-v1",
    },
];

const VOICE_THREAT_ANALYSIS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Vishing Analyst",
        expertise: &["vishing", "social engineering"],
        description: "Assesses call scripts for social-engineering patterns.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Audio Forensics Analyst",
        expertise: &["voice biometrics", "audio quality"],
        description: "Weighs transcription confidence and audio anomaly signals.",
        model: "community-reviewer-v1",
    },
];

const IRC_THREAT_ANALYSIS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Channel Moderator",
        expertise: &["community standards", "abuse patterns"],
        description: "Assesses IRC message content against channel norms.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Network Abuse Analyst",
        expertise: &["botnets", "coordinated abuse"],
        description: "Looks for indicators of coordinated or automated abuse.",
        model: "community-reviewer-v1",
    },
];

const SDCARD_THREAT_ANALYSIS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Malware Analyst",
        expertise: &["static analysis", "malware"],
        description: "Assesses files for malware and dropper indicators.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "Data Exfiltration Analyst",
        expertise: &["data loss prevention", "exfiltration"],
        description: "Looks for signs of staged exfiltration.",
        model: "community-reviewer-v1",
    },
];

const IO_BUS_ANALYSIS: &[PersonaTemplate] = &[
    PersonaTemplate {
        name: "Event Triage Analyst",
        expertise: &["event correlation", "triage"],
        description: "Assesses bus events for anomalous indicators.",
        model: "community-reviewer-v1",
    },
    PersonaTemplate {
        name: "URL Reputation Analyst",
        expertise: &["url reputation", "threat intel"],
        description: "Weighs embedded URLs and references for risk.",
        model: "community-reviewer-v1",
    },
];

pub fn templates_for_topic(topic: &str) -> Option<&'static [PersonaTemplate]> {
    match topic {
        "general_discussion" => Some(GENERAL_DISCUSSION),
        "technical_discussion" => Some(TECHNICAL_DISCUSSION),
        "ai_consciousness" => Some(AI_CONSCIOUSNESS),
        "code_review" => Some(CODE_REVIEW),
        "email_threat_analysis" => Some(EMAIL_THREAT_ANALYSIS),
        "sms_threat_analysis" => Some(SMS_THREAT_ANALYSIS),
        "voice_threat_analysis" => Some(VOICE_THREAT_ANALYSIS),
        "irc_threat_analysis" => Some(IRC_THREAT_ANALYSIS),
        "sdcard_threat_analysis" => Some(SDCARD_THREAT_ANALYSIS),
        "io_bus_analysis" => Some(IO_BUS_ANALYSIS),
        _ => None,
    }
}

/// Builds exactly `count` `PersonaInfo`s for `topic`: drawn from the
/// template table in order, then synthesized by suffixing the last template
/// once the table is exhausted. Falls back to fully synthetic personas for
/// an unrecognized topic.
pub fn build_members(topic: &str, count: usize) -> Vec<PersonaInfo> {
    let templates = templates_for_topic(topic);
    let mut members = Vec::with_capacity(count);

    match templates {
        Some(templates) if !templates.is_empty() => {
            for i in 0..count {
                if let Some(t) = templates.get(i) {
                    members.push(persona_from_template(i, t));
                } else {
                    let last = templates.last().unwrap();
                    let suffix = i - templates.len() + 2;
                    members.push(PersonaInfo {
                        id: format!("persona_{i}"),
                        name: format!("{} {}", last.name, suffix),
                        expertise: last.expertise.iter().map(|s| s.to_string()).collect(),
                        description: last.description.to_string(),
                        model: last.model.to_string(),
                    });
                }
            }
        }
        _ => {
            for i in 0..count {
                members.push(PersonaInfo {
                    id: format!("persona_{i}"),
                    name: format!("Reviewer {}", i + 1),
                    expertise: vec![topic.to_string()],
                    description: format!("Generic reviewer for topic '{topic}'."),
                    model: "community-reviewer-v1".to_string(),
                });
            }
        }
    }

    members
}

fn persona_from_template(index: usize, t: &PersonaTemplate) -> PersonaInfo {
    PersonaInfo {
        id: format!("persona_{index}"),
        name: t.name.to_string(),
        expertise: t.expertise.iter().map(|s| s.to_string()).collect(),
        description: t.description.to_string(),
        model: t.model.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_in_declared_order_up_to_count() {
        let members = build_members("code_review", 2);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "Security Reviewer");
        assert_eq!(members[1].name, "Style Reviewer");
    }

    #[test]
    fn synthesizes_beyond_template_count() {
        let members = build_members("irc_threat_analysis", 4);
        assert_eq!(members.len(), 4);
        assert_eq!(members[2].name, "Network Abuse Analyst 2");
        assert_eq!(members[3].name, "Network Abuse Analyst 3");
    }

    #[test]
    fn unknown_topic_synthesizes_fully() {
        let members = build_members("unmapped_topic", 3);
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| m.expertise == vec!["unmapped_topic".to_string()]));
    }
}
