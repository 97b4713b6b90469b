use crate::models::result::TestResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// One submitted value, keyed by question id: free text or a single selected
/// option id for Input/Radio, a list of selected option ids for Checkbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedValue {
    Text(String),
    Selection(Vec<Uuid>),
}

pub type Submission = HashMap<Uuid, SubmittedValue>;

/// Canonical correct answer reported alongside each verdict. `Single` is
/// `None` only for the anomaly of a Radio question with no flagged option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Text(String),
    Single(Option<Uuid>),
    Options(BTreeSet<Uuid>),
}

#[derive(Debug, Clone, Serialize)]
pub struct GradingOutcome {
    pub correctness: HashMap<Uuid, bool>,
    pub correct_answers: HashMap<Uuid, CorrectAnswer>,
    pub result: TestResult,
}

/// Replay of a past attempt. `stored_score` is the snapshot taken at grading
/// time; the maps are recomputed from the current option flags and answer
/// rows, and may diverge from it after flag edits or a retake.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub result_id: Uuid,
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub stored_score: i32,
    pub correctness: HashMap<Uuid, bool>,
    pub correct_answers: HashMap<Uuid, CorrectAnswer>,
}
