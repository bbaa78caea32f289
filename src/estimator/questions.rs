//! Dynamic question selection
//!
//! Given the questions registered for a (service_type, subcategory) pair and
//! the answers accumulated so far, pick the next question to ask. When no
//! eligible question remains the session is ready for scope generation.

use std::collections::HashMap;

use crate::domain::questions::DynamicQuestion;

/// Select the next unanswered question whose conditional predicate (if any)
/// evaluates true against the accumulated answers.
///
/// Ordering is strict ascending `sequence`, ties broken by id, so repeated
/// polls of the same session see the same order.
pub fn next_question<'a>(
    questions: &'a [DynamicQuestion],
    answers: &HashMap<i64, String>,
) -> Option<&'a DynamicQuestion> {
    let mut eligible: Vec<&DynamicQuestion> = questions
        .iter()
        .filter(|q| !answers.contains_key(&q.id))
        .filter(|q| match &q.conditional_tag {
            Some(tag) => tag.0.evaluate(answers),
            None => true,
        })
        .collect();

    eligible.sort_by_key(|q| (q.sequence, q.id));
    eligible.first().copied()
}

/// Questions marked required that have no answer yet. Consumed by scope
/// generation to flag missing data as clarifications; the selector itself
/// never distinguishes required from optional.
pub fn missing_required<'a>(
    questions: &'a [DynamicQuestion],
    answers: &HashMap<i64, String>,
) -> Vec<&'a DynamicQuestion> {
    questions
        .iter()
        .filter(|q| q.required_for_scope && !answers.contains_key(&q.id))
        .filter(|q| match &q.conditional_tag {
            Some(tag) => tag.0.evaluate(answers),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::questions::ConditionalPredicate;

    fn question(id: i64, sequence: i32, tag: Option<ConditionalPredicate>) -> DynamicQuestion {
        DynamicQuestion {
            id,
            service_type: "Carpentry".to_string(),
            subcategory: "Deck Repair".to_string(),
            question_text: format!("Question {}", id),
            response_type: "text".to_string(),
            options: sqlx::types::Json(vec![]),
            sequence,
            required_for_scope: true,
            conditional_tag: tag.map(sqlx::types::Json),
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, v)| (*id, v.to_string())).collect()
    }

    #[test]
    fn offers_lowest_sequence_first() {
        let qs = vec![question(2, 20, None), question(1, 10, None)];
        let next = next_question(&qs, &HashMap::new()).unwrap();
        assert_eq!(next.id, 1);
    }

    #[test]
    fn never_reoffers_answered_question() {
        let qs = vec![question(1, 10, None), question(2, 20, None)];
        let next = next_question(&qs, &answers(&[(1, "done")])).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn conditional_question_gated_until_predicate_true() {
        let qs = vec![
            question(1, 10, None),
            question(
                2,
                20,
                Some(ConditionalPredicate::AnswerContains {
                    question_id: 1,
                    substring: "railing".to_string(),
                }),
            ),
        ];

        // Predicate false: question 2 is skipped entirely
        assert!(next_question(&qs, &answers(&[(1, "just the boards")])).is_none());

        // Predicate true: question 2 becomes eligible
        let next = next_question(&qs, &answers(&[(1, "boards and Railing")])).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn exhausted_questions_means_ready() {
        let qs = vec![question(1, 10, None)];
        assert!(next_question(&qs, &answers(&[(1, "yes")])).is_none());
    }

    #[test]
    fn equal_sequence_tie_break_is_stable() {
        let qs = vec![question(7, 10, None), question(3, 10, None)];
        for _ in 0..3 {
            assert_eq!(next_question(&qs, &HashMap::new()).unwrap().id, 3);
        }
    }

    #[test]
    fn answer_equals_predicate_is_case_insensitive() {
        let pred = ConditionalPredicate::AnswerEquals {
            question_id: 1,
            value: "Yes".to_string(),
        };
        assert!(pred.evaluate(&answers(&[(1, "yes")])));
        assert!(!pred.evaluate(&answers(&[(1, "no")])));
        assert!(!pred.evaluate(&HashMap::new()));
    }

    #[test]
    fn missing_required_skips_gated_and_answered() {
        let qs = vec![
            question(1, 10, None),
            question(
                2,
                20,
                Some(ConditionalPredicate::Answered { question_id: 99 }),
            ),
        ];
        let missing = missing_required(&qs, &HashMap::new());
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, 1);
    }
}
