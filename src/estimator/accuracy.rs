//! Estimate accuracy scoring and learning metadata
//!
//! Compares an estimate against the actual outcome of a completed job and
//! produces a normalized [0,1] score. The score ranks training examples and
//! tags jobs for retrieval; it is computed once at completion and never
//! recomputed.

use crate::domain::jobs::CompletedJob;

/// Score one dimension (hours or cost) of an estimate against its actual.
///
/// Policy:
/// - both absent: dimension excluded (None)
/// - estimated 0, actual 0: 1.0 (e.g. bundled pricing)
/// - estimated 0, actual > 0: 0.0 (estimate missed entirely)
/// - actual 0, estimated > 0: 0.5 (over-estimated, not the worst case)
/// - both > 0: symmetric relative error capped at 1, so a 100%+
///   discrepancy floors at 0, never negative
pub fn dimension_score(estimated: Option<f64>, actual: Option<f64>) -> Option<f64> {
    let (est, act) = match (estimated, actual) {
        (Some(e), Some(a)) => (e, a),
        _ => return None,
    };

    if est == 0.0 && act == 0.0 {
        return Some(1.0);
    }
    if est == 0.0 {
        return Some(0.0);
    }
    if act == 0.0 {
        return Some(0.5);
    }

    let relative_error = (est - act).abs() / est.max(act);
    Some((1.0 - relative_error.min(1.0)).max(0.0))
}

/// Overall accuracy: the mean of whichever dimension scores were computable;
/// None when neither was (guarding the empty average).
pub fn calculate_accuracy_score(
    estimated_hours: Option<f64>,
    actual_hours: Option<f64>,
    estimated_cost_cents: Option<i64>,
    actual_cost_cents: Option<i64>,
) -> Option<f64> {
    let scores: Vec<f64> = [
        dimension_score(estimated_hours, actual_hours),
        dimension_score(
            estimated_cost_cents.map(|c| c as f64),
            actual_cost_cents.map(|c| c as f64),
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Maximum length of an issues note before a job stops counting as a clean
/// training example.
const MAX_ISSUE_NOTE_LEN: usize = 50;

/// Whether a completed job should be weighted more heavily as a precedent:
/// accurate, well-rated, and without substantive issues.
pub fn is_high_quality_training_example(job: &CompletedJob) -> bool {
    let accurate = job.accuracy_score.map(|s| s >= 0.75).unwrap_or(false);
    let well_rated = job.customer_rating.map(|r| r >= 4).unwrap_or(false);
    let clean = job
        .issues_encountered
        .as_deref()
        .map(|t| t.trim().len() <= MAX_ISSUE_NOTE_LEN)
        .unwrap_or(true);

    accurate && well_rated && clean
}

/// Derive descriptive tags for retrieval filtering. Purely metadata; no
/// numeric effect on scoring.
pub fn generate_job_tags(
    estimated_hours: Option<f64>,
    actual_hours: Option<f64>,
    accuracy_score: Option<f64>,
    narrative: &str,
) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(actual) = actual_hours {
        if actual < 2.0 {
            tags.push("quick_fix".to_string());
        } else if actual > 8.0 {
            tags.push("multi_day".to_string());
        }
    }

    if let Some(score) = accuracy_score {
        if score >= 0.9 {
            tags.push("accurate_estimate".to_string());
        } else if score < 0.6 {
            tags.push("estimation_challenge".to_string());
        }
    }

    if let (Some(est), Some(act)) = (estimated_hours, actual_hours) {
        if est > 0.0 && (act - est).abs() / est > 0.5 {
            tags.push("scope_change".to_string());
        }
    }

    let lower = narrative.to_lowercase();
    if ["rain", "snow", "storm", "weather", "frozen", "heat wave"]
        .iter()
        .any(|k| lower.contains(k))
    {
        tags.push("weather_factor".to_string());
    }
    if ["urgent", "emergency", "asap", "same day"]
        .iter()
        .any(|k| lower.contains(k))
    {
        tags.push("urgent".to_string());
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn job(accuracy: Option<f64>, rating: Option<i32>, issues: Option<&str>) -> CompletedJob {
        CompletedJob {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            original_scope: serde_json::json!({}),
            structured_answers: HashMap::new(),
            estimated_man_hours: Some(4.0),
            estimated_cost_cents: Some(50_000),
            actual_man_hours: Some(4.0),
            actual_cost_cents: Some(50_000),
            customer_rating: rating,
            issues_encountered: issues.map(str::to_string),
            accuracy_score: accuracy,
            tags: vec![],
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn both_zero_is_perfect() {
        assert_eq!(dimension_score(Some(0.0), Some(0.0)), Some(1.0));
    }

    #[test]
    fn estimate_missed_entirely_is_zero() {
        assert_eq!(dimension_score(Some(0.0), Some(3.0)), Some(0.0));
    }

    #[test]
    fn overestimate_against_zero_actual_is_half() {
        assert_eq!(dimension_score(Some(3.0), Some(0.0)), Some(0.5));
    }

    #[test]
    fn absent_dimension_is_excluded() {
        assert_eq!(dimension_score(None, Some(3.0)), None);
        assert_eq!(dimension_score(Some(3.0), None), None);
        assert_eq!(dimension_score(None, None), None);
    }

    #[test]
    fn relative_error_is_symmetric() {
        let a = dimension_score(Some(10.0), Some(20.0)).unwrap();
        let b = dimension_score(Some(20.0), Some(10.0)).unwrap();
        assert!((a - b).abs() < 1e-12);
        assert!((a - 0.5).abs() < 1e-12);
    }

    #[test]
    fn large_discrepancy_floors_at_zero() {
        let score = dimension_score(Some(1.0), Some(1_000.0)).unwrap();
        assert!(score >= 0.0);
        assert!(score < 0.01);
    }

    #[test]
    fn score_is_always_in_unit_interval() {
        for (e, a) in [(1.0, 1.0), (5.0, 2.0), (0.5, 100.0), (7.0, 7.5)] {
            let s = dimension_score(Some(e), Some(a)).unwrap();
            assert!((0.0..=1.0).contains(&s), "est={} act={} s={}", e, a, s);
        }
    }

    #[test]
    fn perfect_job_scores_one() {
        let score =
            calculate_accuracy_score(Some(10.0), Some(10.0), Some(100_000), Some(100_000));
        assert_eq!(score, Some(1.0));
    }

    #[test]
    fn doubled_hours_scores_half_on_that_dimension() {
        assert_eq!(dimension_score(Some(10.0), Some(20.0)), Some(0.5));
        // Overall blends the perfect cost dimension with the halved hours
        let overall =
            calculate_accuracy_score(Some(10.0), Some(20.0), Some(100_000), Some(100_000));
        assert_eq!(overall, Some(0.75));
    }

    #[test]
    fn no_computable_dimension_yields_none() {
        assert_eq!(calculate_accuracy_score(None, None, None, None), None);
        assert_eq!(calculate_accuracy_score(Some(4.0), None, None, Some(1)), None);
    }

    #[test]
    fn high_quality_gate() {
        assert!(is_high_quality_training_example(&job(
            Some(0.8),
            Some(5),
            None
        )));
        assert!(is_high_quality_training_example(&job(
            Some(0.75),
            Some(4),
            Some("minor delay")
        )));
        // Below accuracy threshold
        assert!(!is_high_quality_training_example(&job(
            Some(0.7),
            Some(5),
            None
        )));
        // Poor rating
        assert!(!is_high_quality_training_example(&job(
            Some(0.9),
            Some(3),
            None
        )));
        // Long issue note
        let long_note = "a".repeat(60);
        assert!(!is_high_quality_training_example(&job(
            Some(0.9),
            Some(5),
            Some(&long_note)
        )));
        // Unknown accuracy never qualifies
        assert!(!is_high_quality_training_example(&job(None, Some(5), None)));
    }

    #[test]
    fn tags_reflect_duration_and_accuracy() {
        let tags = generate_job_tags(Some(1.0), Some(1.5), Some(0.95), "");
        assert!(tags.contains(&"quick_fix".to_string()));
        assert!(tags.contains(&"accurate_estimate".to_string()));

        let tags = generate_job_tags(Some(4.0), Some(10.0), Some(0.4), "rain delay on day two");
        assert!(tags.contains(&"multi_day".to_string()));
        assert!(tags.contains(&"estimation_challenge".to_string()));
        assert!(tags.contains(&"scope_change".to_string()));
        assert!(tags.contains(&"weather_factor".to_string()));
    }

    #[test]
    fn urgent_tag_from_narrative() {
        let tags = generate_job_tags(None, None, None, "customer needed same day service");
        assert_eq!(tags, vec!["urgent".to_string()]);
    }
}
