use crate::dto::grading_dto::{CorrectAnswer, SubmittedValue};
use crate::models::option::AnswerOption;
use crate::models::question::{Question, QuestionKind};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A question joined with its options, as loaded by the grading and review
/// paths. Carries no storage handle; evaluation is pure.
#[derive(Debug, Clone)]
pub struct LoadedQuestion {
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    pub correct_answer: CorrectAnswer,
}

/// Grades one question against one submitted value. An absent submission is
/// always incorrect, except for a Checkbox question whose correct set is
/// itself empty (a data-integrity anomaly, matched trivially).
pub fn evaluate(loaded: &LoadedQuestion, submitted: Option<&SubmittedValue>) -> Verdict {
    match loaded.question.kind {
        QuestionKind::Input => evaluate_input(&loaded.question, submitted),
        QuestionKind::Radio => evaluate_radio(loaded, submitted),
        QuestionKind::Checkbox => evaluate_checkbox(loaded, submitted),
    }
}

fn evaluate_input(question: &Question, submitted: Option<&SubmittedValue>) -> Verdict {
    let stored = match question.correct_answer.as_deref() {
        Some(s) => s,
        None => {
            // Schema guarantees this never happens; grade it as unanswerable.
            tracing::warn!(question_id = %question.id, "input question has no stored correct answer");
            ""
        }
    };

    // Exact, case-sensitive comparison; trimming happened at creation time.
    let is_correct = matches!(submitted, Some(SubmittedValue::Text(text)) if text == stored);

    Verdict {
        is_correct,
        correct_answer: CorrectAnswer::Text(stored.to_string()),
    }
}

/// The single canonical correct option for a Radio question: the flagged
/// option with the lowest id. Zero or multiple flags is a data-integrity
/// anomaly; the tie-break keeps grading deterministic rather than guessing
/// author intent.
pub fn canonical_radio_option(loaded: &LoadedQuestion) -> Option<Uuid> {
    let flagged: Vec<Uuid> = loaded
        .options
        .iter()
        .filter(|o| o.is_correct)
        .map(|o| o.id)
        .collect();

    if flagged.len() != 1 {
        tracing::warn!(
            question_id = %loaded.question.id,
            flagged = flagged.len(),
            "radio question does not have exactly one correct option"
        );
    }

    flagged.into_iter().min()
}

fn evaluate_radio(loaded: &LoadedQuestion, submitted: Option<&SubmittedValue>) -> Verdict {
    let canonical = canonical_radio_option(loaded);

    let selected = match submitted {
        Some(SubmittedValue::Text(text)) => Uuid::parse_str(text).ok(),
        Some(SubmittedValue::Selection(ids)) if ids.len() == 1 => Some(ids[0]),
        _ => None,
    };

    Verdict {
        is_correct: canonical.is_some() && selected == canonical,
        correct_answer: CorrectAnswer::Single(canonical),
    }
}

/// The correct option-id set for a Checkbox question.
pub fn correct_option_set(loaded: &LoadedQuestion) -> BTreeSet<Uuid> {
    let set: BTreeSet<Uuid> = loaded
        .options
        .iter()
        .filter(|o| o.is_correct)
        .map(|o| o.id)
        .collect();

    if set.is_empty() {
        tracing::warn!(
            question_id = %loaded.question.id,
            "checkbox question has no correct options"
        );
    }

    set
}

fn evaluate_checkbox(loaded: &LoadedQuestion, submitted: Option<&SubmittedValue>) -> Verdict {
    let correct = correct_option_set(loaded);

    let selected: BTreeSet<Uuid> = match submitted {
        Some(SubmittedValue::Selection(ids)) => ids.iter().copied().collect(),
        Some(SubmittedValue::Text(text)) => Uuid::parse_str(text).into_iter().collect(),
        None => BTreeSet::new(),
    };

    // Set equality: any missing or extra selection fails the question.
    Verdict {
        is_correct: selected == correct,
        correct_answer: CorrectAnswer::Options(correct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(kind: QuestionKind, correct_answer: Option<&str>) -> Question {
        Question {
            id: Uuid::new_v4(),
            test_id: Uuid::new_v4(),
            question_text: "q".into(),
            kind,
            position: 1,
            correct_answer: correct_answer.map(String::from),
        }
    }

    fn option(question_id: Uuid, is_correct: bool) -> AnswerOption {
        AnswerOption {
            id: Uuid::new_v4(),
            question_id,
            option_text: "opt".into(),
            is_correct,
        }
    }

    #[test]
    fn input_exact_match_is_correct() {
        let loaded = LoadedQuestion {
            question: question(QuestionKind::Input, Some("4")),
            options: vec![],
        };

        let hit = evaluate(&loaded, Some(&SubmittedValue::Text("4".into())));
        assert!(hit.is_correct);
        assert_eq!(hit.correct_answer, CorrectAnswer::Text("4".into()));

        let miss = evaluate(&loaded, Some(&SubmittedValue::Text(" 4".into())));
        assert!(!miss.is_correct, "comparison is exact, no trimming");

        let case = evaluate(&loaded, Some(&SubmittedValue::Text("Four".into())));
        assert!(!case.is_correct);
    }

    #[test]
    fn input_missing_submission_is_incorrect() {
        let loaded = LoadedQuestion {
            question: question(QuestionKind::Input, Some("4")),
            options: vec![],
        };
        assert!(!evaluate(&loaded, None).is_correct);
    }

    #[test]
    fn radio_matches_only_the_flagged_option() {
        let q = question(QuestionKind::Radio, None);
        let right = option(q.id, true);
        let wrong = option(q.id, false);
        let loaded = LoadedQuestion {
            question: q,
            options: vec![wrong.clone(), right.clone()],
        };

        let hit = evaluate(&loaded, Some(&SubmittedValue::Text(right.id.to_string())));
        assert!(hit.is_correct);
        assert_eq!(hit.correct_answer, CorrectAnswer::Single(Some(right.id)));

        let miss = evaluate(&loaded, Some(&SubmittedValue::Text(wrong.id.to_string())));
        assert!(!miss.is_correct);

        assert!(!evaluate(&loaded, None).is_correct);
    }

    #[test]
    fn radio_multiple_flags_break_tie_by_lowest_id() {
        let q = question(QuestionKind::Radio, None);
        let a = option(q.id, true);
        let b = option(q.id, true);
        let lowest = a.id.min(b.id);
        let loaded = LoadedQuestion {
            question: q,
            options: vec![a, b],
        };

        let verdict = evaluate(&loaded, Some(&SubmittedValue::Text(lowest.to_string())));
        assert!(verdict.is_correct);
        assert_eq!(verdict.correct_answer, CorrectAnswer::Single(Some(lowest)));
    }

    #[test]
    fn radio_with_no_flagged_option_never_grades_correct() {
        let q = question(QuestionKind::Radio, None);
        let only = option(q.id, false);
        let loaded = LoadedQuestion {
            question: q,
            options: vec![only.clone()],
        };

        let verdict = evaluate(&loaded, Some(&SubmittedValue::Text(only.id.to_string())));
        assert!(!verdict.is_correct);
        assert_eq!(verdict.correct_answer, CorrectAnswer::Single(None));
    }

    #[test]
    fn checkbox_requires_exact_set_equality() {
        let q = question(QuestionKind::Checkbox, None);
        let a = option(q.id, true);
        let b = option(q.id, true);
        let c = option(q.id, false);
        let loaded = LoadedQuestion {
            question: q,
            options: vec![a.clone(), b.clone(), c.clone()],
        };

        let subset = evaluate(&loaded, Some(&SubmittedValue::Selection(vec![a.id])));
        assert!(!subset.is_correct);

        let exact = evaluate(&loaded, Some(&SubmittedValue::Selection(vec![b.id, a.id])));
        assert!(exact.is_correct, "order of selections is irrelevant");

        let superset = evaluate(
            &loaded,
            Some(&SubmittedValue::Selection(vec![a.id, b.id, c.id])),
        );
        assert!(!superset.is_correct);
    }

    #[test]
    fn checkbox_empty_submission_matches_only_empty_correct_set() {
        let q = question(QuestionKind::Checkbox, None);
        let flagged = option(q.id, true);

        let with_correct = LoadedQuestion {
            question: q.clone(),
            options: vec![flagged],
        };
        assert!(!evaluate(&with_correct, None).is_correct);

        let anomaly = LoadedQuestion {
            question: q.clone(),
            options: vec![option(q.id, false)],
        };
        assert!(evaluate(&anomaly, None).is_correct);
        assert!(evaluate(&anomaly, Some(&SubmittedValue::Selection(vec![]))).is_correct);
    }

    #[test]
    fn duplicate_selections_collapse_into_a_set() {
        let q = question(QuestionKind::Checkbox, None);
        let a = option(q.id, true);
        let loaded = LoadedQuestion {
            question: q,
            options: vec![a.clone()],
        };

        let verdict = evaluate(&loaded, Some(&SubmittedValue::Selection(vec![a.id, a.id])));
        assert!(verdict.is_correct);
    }
}
