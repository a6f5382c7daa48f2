use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use serde_json::from_str;

static DATA_DIR: Dir = include_dir!("src/data");

/// One true/false sentence shown to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
    pub truth: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named pool of sentences an operator curates as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sentences: Vec<Sentence>,
}

/// Run configuration plus the identity fields that link it to a dataset.
///
/// Field names and defaults follow the JSON the operator edits:
/// `showTimer` is true unless explicitly false, `randomize` is true unless
/// explicitly false, `showQuestionCount` must be explicitly enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSet {
    pub id: String,
    pub name: String,
    pub sentence_set_id: String,
    #[serde(default)]
    pub question_count: Option<usize>,
    #[serde(default = "default_true")]
    pub randomize: bool,
    #[serde(default)]
    pub enable_time_limit: bool,
    #[serde(default = "default_duration_sec")]
    pub duration_sec: f64,
    #[serde(default = "default_true")]
    pub show_timer: bool,
    #[serde(default)]
    pub show_question_count: bool,
    #[serde(default)]
    pub notes: String,
}

/// Operator preferences: response key bindings and the last selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_true_key")]
    pub true_key: char,
    #[serde(default = "default_false_key")]
    pub false_key: char,
    #[serde(default)]
    pub active_task_set_id: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            true_key: default_true_key(),
            false_key: default_false_key(),
            active_task_set_id: None,
        }
    }
}

/// The key bindings a finished run reports back in its payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBindings {
    pub true_key: char,
    pub false_key: char,
}

impl From<&Preferences> for KeyBindings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            true_key: prefs.true_key,
            false_key: prefs.false_key,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_duration_sec() -> f64 {
    120.0
}

fn default_true_key() -> char {
    'f'
}

fn default_false_key() -> char {
    'j'
}

/// Sentence sets bundled into the binary, used when no stored data exists.
pub fn builtin_sentence_sets() -> Vec<SentenceSet> {
    parse_embedded("sentence_sets.json")
}

/// Task sets bundled into the binary, used when no stored data exists.
pub fn builtin_task_sets() -> Vec<TaskSet> {
    parse_embedded("task_sets.json")
}

fn parse_embedded<T: for<'de> Deserialize<'de>>(file_name: &str) -> T {
    let file = DATA_DIR
        .get_file(file_name)
        .expect("bundled data file not found");

    let contents = file
        .contents_utf8()
        .expect("unable to interpret bundled file as a string");

    from_str(contents).expect("unable to deserialize bundled data json")
}
