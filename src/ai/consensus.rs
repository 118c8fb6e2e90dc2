//! Consensus aggregation math (§4.5, canonical). The mean/variance shape
//! mirrors the teacher's moving-average anomaly detector
//! (`processor::processors::anomaly_detector::MovingAverageState`), applied
//! over a single batch of persona scores instead of a streaming window.

use std::collections::HashMap;

use crate::model::{Consensus, PersonaReview};

/// `overall_score = mean(scores)`, `agreement = clamp(1 - variance, 0, 1)`,
/// `confidence_level = agreement * 0.9` (the design notes permit either this
/// or mean-of-confidences; we fix the former so it stays a pure function of
/// `overall_score`/`agreement` alone).
pub fn compute(reviews: &[PersonaReview]) -> Consensus {
    if reviews.is_empty() {
        return Consensus::default();
    }

    let n = reviews.len() as f64;
    let sum: f64 = reviews.iter().map(|r| r.score).sum();
    let overall_score = sum / n;

    let sum_sq_diff: f64 = reviews.iter().map(|r| (r.score - overall_score).powi(2)).sum();
    let variance = sum_sq_diff / n;
    let agreement = (1.0 - variance).clamp(0.0, 1.0);

    let confidence_level = agreement * 0.9;

    let key_points = key_points(reviews);
    let dissenting = dissenting_points(reviews, overall_score);
    let recommendation = recommendation_text(overall_score);

    Consensus {
        overall_score,
        agreement,
        recommendation,
        key_points,
        dissenting,
        confidence_level,
    }
}

fn key_points(reviews: &[PersonaReview]) -> Vec<String> {
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    for review in reviews {
        for tag in &review.tags {
            *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let threshold = reviews.len() / 2;
    let mut points: Vec<String> = tag_counts
        .into_iter()
        .filter(|(_, count)| *count >= threshold.max(1))
        .map(|(tag, _)| format!("Multiple reviewers noted: {tag}"))
        .collect();
    points.sort();
    points
}

fn dissenting_points(reviews: &[PersonaReview], overall_score: f64) -> Vec<String> {
    reviews
        .iter()
        .filter(|r| (r.score - overall_score).abs() > 0.3)
        .map(|r| format!("{}: {:.2} ({})", r.persona_name, r.score, r.review))
        .collect()
}

/// Monotone recommendation text keyed to the same thresholds used for the
/// threat-oriented tables (§6): 0.9/0.8/0.7/0.6/0.4.
pub fn recommendation_text(score: f64) -> String {
    if score >= 0.9 {
        "Highly recommended - excellent content quality".to_string()
    } else if score >= 0.8 {
        "Recommended - good content with minor considerations".to_string()
    } else if score >= 0.7 {
        "Acceptable - content meets community standards".to_string()
    } else if score >= 0.6 {
        "Requires attention - some concerns noted".to_string()
    } else if score >= 0.4 {
        "Needs review - multiple issues identified".to_string()
    } else {
        "Not recommended - significant concerns".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn review(score: f64, tags: &[&str]) -> PersonaReview {
        PersonaReview {
            persona_id: "p".into(),
            persona_name: "Persona".into(),
            expertise: vec![],
            review: "review text".into(),
            score,
            confidence: 0.8,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            metadata: Map::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn overall_score_is_mean() {
        let reviews = vec![review(0.2, &[]), review(0.4, &[]), review(0.9, &[])];
        let consensus = compute(&reviews);
        let expected = (0.2 + 0.4 + 0.9) / 3.0;
        assert!((consensus.overall_score - expected).abs() < 1e-9);
    }

    #[test]
    fn agreement_is_in_bounds() {
        let reviews = vec![review(0.0, &[]), review(1.0, &[]), review(0.5, &[])];
        let consensus = compute(&reviews);
        assert!(consensus.agreement >= 0.0 && consensus.agreement <= 1.0);
    }

    #[test]
    fn identical_scores_yield_full_agreement() {
        let reviews = vec![review(0.7, &[]), review(0.7, &[]), review(0.7, &[])];
        let consensus = compute(&reviews);
        assert!((consensus.agreement - 1.0).abs() < 1e-9);
    }

    #[test]
    fn key_points_require_majority() {
        let reviews = vec![
            review(0.5, &["phishing"]),
            review(0.6, &["phishing"]),
            review(0.7, &["unrelated"]),
        ];
        let consensus = compute(&reviews);
        assert_eq!(consensus.key_points, vec!["Multiple reviewers noted: phishing".to_string()]);
    }

    #[test]
    fn recommendation_thresholds() {
        assert_eq!(recommendation_text(0.9), "Highly recommended - excellent content quality");
        assert_eq!(recommendation_text(0.8), "Recommended - good content with minor considerations");
        assert_eq!(recommendation_text(0.7999), "Acceptable - content meets community standards");
        assert_eq!(recommendation_text(0.39), "Not recommended - significant concerns");
    }

    #[test]
    fn empty_reviews_yield_default_consensus() {
        let consensus = compute(&[]);
        assert_eq!(consensus.overall_score, 0.0);
    }
}
