//! Historical precedent matching
//!
//! Ranks completed jobs of the same (service_type, subcategory) by how well
//! their structured answers overlap the current session's answers, then by
//! accuracy score, then by recency. The winners supply representative
//! actual-hours and actual-cost figures for the cost basis.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::jobs::CompletedJob;
use crate::estimator::accuracy::is_high_quality_training_example;

/// Count answer values shared with a precedent job. Keys are question ids
/// (serialized as strings in the stored job); values compare
/// case-insensitively.
fn answer_overlap(answers: &HashMap<i64, String>, job: &CompletedJob) -> usize {
    answers
        .iter()
        .filter(|(id, value)| {
            job.structured_answers
                .get(&id.to_string())
                .map(|stored| stored.eq_ignore_ascii_case(value))
                .unwrap_or(false)
        })
        .count()
}

fn similarity(answers: &HashMap<i64, String>, job: &CompletedJob) -> f64 {
    let overlap = answer_overlap(answers, job) as f64;
    let quality_boost = if is_high_quality_training_example(job) {
        1.5
    } else {
        0.0
    };
    overlap * 2.0 + quality_boost
}

/// Rank precedents for a session. The jobs are assumed to be pre-filtered to
/// the session's (service_type, subcategory).
pub fn rank_precedents(
    mut jobs: Vec<CompletedJob>,
    answers: &HashMap<i64, String>,
) -> Vec<CompletedJob> {
    jobs.sort_by(|a, b| {
        similarity(answers, b)
            .partial_cmp(&similarity(answers, a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.accuracy_score
                    .unwrap_or(0.0)
                    .partial_cmp(&a.accuracy_score.unwrap_or(0.0))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.completed_at.cmp(&a.completed_at))
    });
    jobs
}

/// Representative actuals drawn from the ranked precedents. High-quality
/// training examples count double in the averages.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedentStats {
    pub count: usize,
    pub avg_actual_hours: Option<f64>,
    pub avg_actual_cost_cents: Option<i64>,
    pub hours_range: Option<(f64, f64)>,
    pub cost_range_cents: Option<(i64, i64)>,
}

pub fn summarize(jobs: &[CompletedJob]) -> Option<PrecedentStats> {
    if jobs.is_empty() {
        return None;
    }

    let mut hour_sum = 0.0;
    let mut hour_weight = 0.0;
    let mut hours_min = f64::MAX;
    let mut hours_max = f64::MIN;
    let mut cost_sum = 0.0;
    let mut cost_weight = 0.0;
    let mut cost_min = i64::MAX;
    let mut cost_max = i64::MIN;

    for job in jobs {
        let weight = if is_high_quality_training_example(job) {
            2.0
        } else {
            1.0
        };
        if let Some(hours) = job.actual_man_hours {
            hour_sum += hours * weight;
            hour_weight += weight;
            hours_min = hours_min.min(hours);
            hours_max = hours_max.max(hours);
        }
        if let Some(cost) = job.actual_cost_cents {
            cost_sum += cost as f64 * weight;
            cost_weight += weight;
            cost_min = cost_min.min(cost);
            cost_max = cost_max.max(cost);
        }
    }

    Some(PrecedentStats {
        count: jobs.len(),
        avg_actual_hours: (hour_weight > 0.0).then(|| hour_sum / hour_weight),
        avg_actual_cost_cents: (cost_weight > 0.0).then(|| (cost_sum / cost_weight).round() as i64),
        hours_range: (hour_weight > 0.0).then_some((hours_min, hours_max)),
        cost_range_cents: (cost_weight > 0.0).then_some((cost_min, cost_max)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn job(
        overlap_answers: &[(&str, &str)],
        accuracy: Option<f64>,
        days_ago: i64,
        actual_hours: Option<f64>,
        actual_cost: Option<i64>,
    ) -> CompletedJob {
        CompletedJob {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            original_scope: serde_json::json!({}),
            structured_answers: overlap_answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            estimated_man_hours: actual_hours,
            estimated_cost_cents: actual_cost,
            actual_man_hours: actual_hours,
            actual_cost_cents: actual_cost,
            customer_rating: Some(5),
            issues_encountered: None,
            accuracy_score: accuracy,
            tags: vec![],
            completed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, v)| (*id, v.to_string())).collect()
    }

    #[test]
    fn ranks_by_answer_overlap_first() {
        let session = answers(&[(1, "under sink"), (2, "copper")]);
        let jobs = vec![
            job(&[("1", "crawlspace")], Some(0.99), 0, Some(2.0), None),
            job(
                &[("1", "Under Sink"), ("2", "copper")],
                Some(0.5),
                30,
                Some(3.0),
                None,
            ),
        ];
        let ranked = rank_precedents(jobs, &session);
        assert_eq!(ranked[0].actual_man_hours, Some(3.0));
    }

    #[test]
    fn ties_fall_back_to_accuracy_then_recency() {
        let session = answers(&[]);
        let jobs = vec![
            job(&[], Some(0.6), 1, Some(1.0), None),
            job(&[], Some(0.9), 10, Some(2.0), None),
            job(&[], Some(0.9), 2, Some(3.0), None),
        ];
        // Equal similarity (no high-quality boost: accuracy 0.9 + rating 5
        // qualifies, so force ratings below the gate)
        let jobs: Vec<CompletedJob> = jobs
            .into_iter()
            .map(|mut j| {
                j.customer_rating = Some(3);
                j
            })
            .collect();
        let ranked = rank_precedents(jobs, &session);
        assert_eq!(ranked[0].actual_man_hours, Some(3.0));
        assert_eq!(ranked[1].actual_man_hours, Some(2.0));
        assert_eq!(ranked[2].actual_man_hours, Some(1.0));
    }

    #[test]
    fn summarize_empty_is_none() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn summarize_weights_high_quality_double() {
        let good = job(&[], Some(0.9), 0, Some(2.0), Some(10_000));
        let mut poor = job(&[], Some(0.3), 0, Some(8.0), Some(40_000));
        poor.customer_rating = Some(2);

        let stats = summarize(&[good, poor]).unwrap();
        // (2*2 + 8*1) / 3 = 4.0
        assert!((stats.avg_actual_hours.unwrap() - 4.0).abs() < 1e-9);
        // (10000*2 + 40000*1) / 3 = 20000
        assert_eq!(stats.avg_actual_cost_cents, Some(20_000));
        assert_eq!(stats.hours_range, Some((2.0, 8.0)));
        assert_eq!(stats.cost_range_cents, Some((10_000, 40_000)));
    }

    #[test]
    fn summarize_skips_absent_dimensions() {
        let only_hours = job(&[], None, 0, Some(5.0), None);
        let stats = summarize(&[only_hours]).unwrap();
        assert!(stats.avg_actual_hours.is_some());
        assert_eq!(stats.avg_actual_cost_cents, None);
        assert_eq!(stats.cost_range_cents, None);
    }
}
