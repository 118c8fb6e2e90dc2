//! Per-channel severity threshold tables (§4.3 step 6, §4.4). A consensus
//! score maps to a discrete `ThreatLevel`; trusted identifiers use a
//! stricter table so the same score takes more convincing before it
//! escalates.

use crate::model::ThreatLevel;

#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl ThresholdTable {
    pub const DEFAULT: ThresholdTable = ThresholdTable { critical: 0.9, high: 0.8, medium: 0.6, low: 0.4 };
    pub const TRUSTED: ThresholdTable = ThresholdTable { critical: 0.95, high: 0.85, medium: 0.7, low: 0.5 };

    pub fn derive(&self, score: f64) -> ThreatLevel {
        if score >= self.critical {
            ThreatLevel::Critical
        } else if score >= self.high {
            ThreatLevel::High
        } else if score >= self.medium {
            ThreatLevel::Medium
        } else if score >= self.low {
            ThreatLevel::Low
        } else {
            ThreatLevel::Minimal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_escalates_at_documented_breakpoints() {
        assert_eq!(ThresholdTable::DEFAULT.derive(0.95), ThreatLevel::Critical);
        assert_eq!(ThresholdTable::DEFAULT.derive(0.85), ThreatLevel::High);
        assert_eq!(ThresholdTable::DEFAULT.derive(0.65), ThreatLevel::Medium);
        assert_eq!(ThresholdTable::DEFAULT.derive(0.45), ThreatLevel::Low);
        assert_eq!(ThresholdTable::DEFAULT.derive(0.1), ThreatLevel::Minimal);
    }

    #[test]
    fn trusted_table_requires_a_higher_score_to_escalate() {
        assert_eq!(ThresholdTable::DEFAULT.derive(0.82), ThreatLevel::High);
        assert_eq!(ThresholdTable::TRUSTED.derive(0.82), ThreatLevel::Medium);
    }
}
