use crate::dataset::{KeyBindings, Preferences, Sentence, SentenceSet, TaskSet};
use crate::runtime::{Clock, SystemClock};
use crate::util::{mean, std_dev};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle phase of a run.
///
/// `TimeUpPending` means the deadline has passed but the participant still
/// gets to answer the sentence on screen; the run ends when that answer is
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "timeup-pending")]
    TimeUpPending,
    #[strum(serialize = "finished")]
    Finished,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("sentence pool is empty")]
    EmptyStimulusPool,
    #[error("no sentences left after applying the question count")]
    NoStimuliAfterFilter,
    #[error("a run is already in progress; reset it first")]
    AlreadyRunning,
}

/// One recorded trial, immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub trial: usize,
    pub sentence_id: Option<i64>,
    pub text: String,
    pub truth: bool,
    pub tags: Vec<String>,
    pub response_true: bool,
    pub correct: bool,
    pub time_since_start_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub time_limit_reached: bool,
}

/// Identity of the sentence set a run drew from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRef {
    pub id: String,
    pub name: String,
}

/// The finished-run record, emitted exactly once per run.
///
/// Serializes to the same camelCase JSON document the result consumer
/// persists and offers for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    pub finished_at: DateTime<Utc>,
    pub task_set: TaskSet,
    pub sentence_set: SetRef,
    pub total_trials: usize,
    pub responses: Vec<Response>,
    pub preferences: KeyBindings,
}

/// The task execution engine: sequences stimuli, records timed responses,
/// enforces an optional deadline, and publishes the result payload.
///
/// All state is instance-local; independent runners never share anything.
/// Timing decisions use the injected monotonic clock only.
#[derive(Debug)]
pub struct TaskRunner {
    clock: Box<dyn Clock>,
    phase: Phase,
    queue: Vec<Sentence>,
    current: Option<usize>,
    responses: Vec<Response>,
    task_set: Option<TaskSet>,
    set_ref: Option<SetRef>,
    keys: KeyBindings,
    started_ms: u64,
    time_limit_ms: u64,
    time_limit_triggered: bool,
    result: Option<ResultPayload>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            phase: Phase::Idle,
            queue: Vec::new(),
            current: None,
            responses: Vec::new(),
            task_set: None,
            set_ref: None,
            keys: KeyBindings {
                true_key: 'f',
                false_key: 'j',
            },
            started_ms: 0,
            time_limit_ms: 0,
            time_limit_triggered: false,
            result: None,
        }
    }

    /// Begin a run. Fails synchronously, with no state change, when the pool
    /// is unusable or a run is already in progress.
    pub fn start(
        &mut self,
        task_set: &TaskSet,
        sentence_set: &SentenceSet,
        preferences: &Preferences,
    ) -> Result<(), StartError> {
        self.start_with_rng(task_set, sentence_set, preferences, &mut rand::thread_rng())
    }

    /// `start` with a caller-supplied RNG so shuffle order is testable.
    pub fn start_with_rng<R: Rng>(
        &mut self,
        task_set: &TaskSet,
        sentence_set: &SentenceSet,
        preferences: &Preferences,
        rng: &mut R,
    ) -> Result<(), StartError> {
        if matches!(self.phase, Phase::Running | Phase::TimeUpPending) {
            return Err(StartError::AlreadyRunning);
        }
        if sentence_set.sentences.is_empty() {
            return Err(StartError::EmptyStimulusPool);
        }

        // Work on an owned copy; the caller's pool is never reordered.
        let mut queue = sentence_set.sentences.clone();
        if task_set.randomize {
            queue.shuffle(rng);
        }
        if let Some(count) = task_set.question_count {
            queue.truncate(count.min(queue.len()));
        }
        if queue.is_empty() {
            return Err(StartError::NoStimuliAfterFilter);
        }

        self.queue = queue;
        self.current = None;
        self.responses = Vec::new();
        self.task_set = Some(task_set.clone());
        self.set_ref = Some(SetRef {
            id: sentence_set.id.clone(),
            name: sentence_set.name.clone(),
        });
        self.keys = KeyBindings::from(preferences);
        self.started_ms = self.clock.now_ms();
        self.time_limit_ms = if task_set.enable_time_limit {
            (task_set.duration_sec * 1000.0) as u64
        } else {
            0
        };
        self.time_limit_triggered = false;
        self.result = None;
        self.phase = Phase::Running;

        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        let next = self.current.map_or(0, |i| i + 1);
        if next >= self.queue.len() {
            self.end_task();
        } else {
            self.current = Some(next);
        }
    }

    /// Record a judgment for the current sentence. Spurious calls (idle,
    /// finished, or no sentence on screen) are silently ignored.
    pub fn handle_response(&mut self, is_true_response: bool) {
        if !self.is_running() {
            return;
        }
        let Some(index) = self.current else {
            return;
        };
        let Some(sentence) = self.queue.get(index) else {
            return;
        };

        let elapsed = self.clock.now_ms().saturating_sub(self.started_ms);
        let response = Response {
            trial: self.responses.len() + 1,
            sentence_id: sentence.id,
            text: sentence.text.clone(),
            truth: sentence.truth,
            tags: sentence.tags.clone(),
            response_true: is_true_response,
            correct: sentence.truth == is_true_response,
            time_since_start_ms: elapsed,
            timestamp: Utc::now(),
            time_limit_reached: self.time_limit_triggered,
        };
        self.responses.push(response);

        if self.time_limit_triggered {
            self.end_task();
        } else {
            self.advance();
        }
    }

    /// Map a raw key to a judgment via the configured bindings
    /// (case-insensitive). Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: char) -> bool {
        if !self.is_running() {
            return false;
        }
        let key = key.to_ascii_lowercase();
        if key == self.keys.true_key.to_ascii_lowercase() {
            self.handle_response(true);
            true
        } else if key == self.keys.false_key.to_ascii_lowercase() {
            self.handle_response(false);
            true
        } else {
            false
        }
    }

    /// Deadline poll, driven by the app's periodic tick. Crossing the
    /// deadline latches; it never terminates the run by itself.
    pub fn on_tick(&mut self) {
        if self.phase != Phase::Running || self.time_limit_ms == 0 {
            return;
        }
        let elapsed = self.clock.now_ms().saturating_sub(self.started_ms);
        if elapsed >= self.time_limit_ms {
            self.time_limit_triggered = true;
            self.phase = Phase::TimeUpPending;
        }
    }

    fn end_task(&mut self) {
        if !self.is_running() {
            return;
        }
        // Both are set for the whole Running phase; a miss means a spurious
        // call, which is absorbed like any other.
        let (Some(task_set), Some(sentence_set)) = (self.task_set.take(), self.set_ref.take())
        else {
            return;
        };
        self.phase = Phase::Finished;

        self.result = Some(ResultPayload {
            finished_at: Utc::now(),
            task_set,
            sentence_set,
            total_trials: self.responses.len(),
            responses: self.responses.clone(),
            preferences: self.keys,
        });
    }

    /// Abandon whatever is in progress and return to `Idle`. Safe to call
    /// from any phase, any number of times.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.queue.clear();
        self.current = None;
        self.responses.clear();
        self.task_set = None;
        self.set_ref = None;
        self.started_ms = 0;
        self.time_limit_ms = 0;
        self.time_limit_triggered = false;
        self.result = None;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while the run accepts responses (including the time's-up grace
    /// trial).
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::TimeUpPending)
    }

    pub fn current_sentence(&self) -> Option<&Sentence> {
        if !self.is_running() {
            return None;
        }
        self.current.and_then(|i| self.queue.get(i))
    }

    /// (1-based current trial, total trials) for the counter display.
    pub fn trial_position(&self) -> (usize, usize) {
        (self.current.map_or(0, |i| i + 1), self.queue.len())
    }

    /// Remaining budget in seconds; `None` when no time limit is armed.
    pub fn remaining_secs(&self) -> Option<f64> {
        if self.time_limit_ms == 0 || !self.is_running() {
            return None;
        }
        let elapsed = self.clock.now_ms().saturating_sub(self.started_ms);
        Some(self.time_limit_ms.saturating_sub(elapsed) as f64 / 1000.0)
    }

    pub fn result(&self) -> Option<&ResultPayload> {
        self.result.as_ref()
    }

    /// Hand the payload to the result consumer. Yields `Some` exactly once
    /// per finished run.
    pub fn take_result(&mut self) -> Option<ResultPayload> {
        self.result.take()
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregates shown on the finished screen, derived from a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub correct: usize,
    pub accuracy_pct: f64,
    pub mean_rt_ms: Option<f64>,
    pub sd_rt_ms: Option<f64>,
    /// (tag, correct, total) sorted by tag
    pub per_tag: Vec<(String, usize, usize)>,
}

impl RunSummary {
    pub fn from_payload(payload: &ResultPayload) -> Self {
        let total = payload.responses.len();
        let correct = payload.responses.iter().filter(|r| r.correct).count();
        let accuracy_pct = if total > 0 {
            (correct as f64 / total as f64 * 100.0).round()
        } else {
            0.0
        };

        // Per-trial time = gap between consecutive cumulative offsets.
        let intervals: Vec<f64> = payload
            .responses
            .iter()
            .scan(0u64, |prev, r| {
                let gap = r.time_since_start_ms.saturating_sub(*prev);
                *prev = r.time_since_start_ms;
                Some(gap as f64)
            })
            .collect();

        let per_tag = payload
            .responses
            .iter()
            .flat_map(|r| r.tags.iter().map(move |t| (t.clone(), r.correct)))
            .into_group_map()
            .into_iter()
            .map(|(tag, outcomes)| {
                let hits = outcomes.iter().filter(|c| **c).count();
                (tag, hits, outcomes.len())
            })
            .sorted()
            .collect();

        Self {
            total,
            correct,
            accuracy_pct,
            mean_rt_ms: mean(&intervals),
            sd_rt_ms: std_dev(&intervals),
            per_tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualClock;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(n: usize) -> SentenceSet {
        SentenceSet {
            id: "set-test".into(),
            name: "テスト".into(),
            description: String::new(),
            sentences: (0..n)
                .map(|i| Sentence {
                    id: Some(i as i64 + 1),
                    text: format!("文 {}", i + 1),
                    truth: i % 2 == 0,
                    tags: if i % 2 == 0 {
                        vec!["even".into()]
                    } else {
                        vec!["odd".into()]
                    },
                })
                .collect(),
        }
    }

    fn task(randomize: bool, question_count: Option<usize>) -> TaskSet {
        TaskSet {
            id: "task-test".into(),
            name: "test task".into(),
            sentence_set_id: "set-test".into(),
            question_count,
            randomize,
            enable_time_limit: false,
            duration_sec: 120.0,
            show_timer: true,
            show_question_count: false,
            notes: String::new(),
        }
    }

    fn timed_task(duration_sec: f64) -> TaskSet {
        TaskSet {
            enable_time_limit: true,
            duration_sec,
            ..task(false, None)
        }
    }

    fn manual_runner() -> (TaskRunner, ManualClock) {
        let clock = ManualClock::new();
        let runner = TaskRunner::with_clock(Box::new(clock.clone()));
        (runner, clock)
    }

    #[test]
    fn starts_idle_and_reset_is_idempotent() {
        let mut runner = TaskRunner::new();
        assert_eq!(runner.phase(), Phase::Idle);

        runner.reset();
        runner.reset();
        assert_eq!(runner.phase(), Phase::Idle);
        assert!(runner.current_sentence().is_none());
    }

    #[test]
    fn empty_pool_is_rejected_and_state_untouched() {
        let mut runner = TaskRunner::new();
        let empty = SentenceSet {
            id: "set-empty".into(),
            name: "empty".into(),
            description: String::new(),
            sentences: vec![],
        };

        let err = runner.start(&task(true, None), &empty, &Preferences::default());

        assert_matches!(err, Err(StartError::EmptyStimulusPool));
        assert_eq!(runner.phase(), Phase::Idle);
        assert!(runner.result().is_none());
    }

    #[test]
    fn zero_question_count_is_rejected() {
        let mut runner = TaskRunner::new();

        let err = runner.start(&task(false, Some(0)), &pool(5), &Preferences::default());

        assert_matches!(err, Err(StartError::NoStimuliAfterFilter));
        assert_eq!(runner.phase(), Phase::Idle);
    }

    #[test]
    fn start_while_running_is_rejected() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, None), &pool(3), &Preferences::default())
            .unwrap();

        let err = runner.start(&task(false, None), &pool(3), &Preferences::default());

        assert_matches!(err, Err(StartError::AlreadyRunning));
        // The original run is untouched
        assert_eq!(runner.trial_position(), (1, 3));
    }

    #[test]
    fn queue_is_truncated_to_question_count() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, Some(3)), &pool(5), &Preferences::default())
            .unwrap();

        assert_eq!(runner.trial_position(), (1, 3));
    }

    #[test]
    fn question_count_larger_than_pool_keeps_whole_pool() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, Some(99)), &pool(4), &Preferences::default())
            .unwrap();

        assert_eq!(runner.trial_position(), (1, 4));
    }

    #[test]
    fn unrandomized_queue_preserves_pool_order() {
        let mut runner = TaskRunner::new();
        let set = pool(5);
        runner
            .start(&task(false, None), &set, &Preferences::default())
            .unwrap();

        for expected in &set.sentences {
            assert_eq!(runner.current_sentence().unwrap().id, expected.id);
            runner.handle_response(true);
        }
        assert_eq!(runner.phase(), Phase::Finished);
    }

    #[test]
    fn shuffled_queue_is_a_permutation_of_the_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut runner = TaskRunner::new();
        let set = pool(8);
        runner
            .start_with_rng(&task(true, None), &set, &Preferences::default(), &mut rng)
            .unwrap();

        let mut seen = Vec::new();
        while runner.is_running() {
            seen.push(runner.current_sentence().unwrap().id.unwrap());
            runner.handle_response(false);
        }

        let mut sorted = seen.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_moves_items_across_seeds() {
        // Statistical sanity: across seeds, the first queue slot is not
        // always the first pool item.
        let set = pool(8);
        let mut moved = false;
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut runner = TaskRunner::new();
            runner
                .start_with_rng(&task(true, None), &set, &Preferences::default(), &mut rng)
                .unwrap();
            if runner.current_sentence().unwrap().id != Some(1) {
                moved = true;
                break;
            }
        }
        assert!(moved, "shuffle never displaced the first pool item");
    }

    #[test]
    fn shuffling_does_not_mutate_the_callers_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut runner = TaskRunner::new();
        let set = pool(8);
        let before = set.sentences.clone();

        runner
            .start_with_rng(&task(true, None), &set, &Preferences::default(), &mut rng)
            .unwrap();

        assert_eq!(set.sentences, before);
    }

    #[test]
    fn scoring_follows_strict_equality() {
        for (truth, response, expected) in [
            (true, true, true),
            (true, false, false),
            (false, true, false),
            (false, false, true),
        ] {
            let mut runner = TaskRunner::new();
            let set = SentenceSet {
                id: "s".into(),
                name: "s".into(),
                description: String::new(),
                sentences: vec![Sentence {
                    id: Some(1),
                    text: "x".into(),
                    truth,
                    tags: vec![],
                }],
            };
            runner
                .start(&task(false, None), &set, &Preferences::default())
                .unwrap();
            runner.handle_response(response);

            let payload = runner.result().unwrap();
            assert_eq!(payload.responses[0].correct, expected);
        }
    }

    #[test]
    fn responses_are_append_only_and_trial_numbered() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, None), &pool(4), &Preferences::default())
            .unwrap();

        for i in 0..4 {
            runner.handle_response(true);
            let recorded = if runner.is_running() {
                runner.trial_position().0 - 1
            } else {
                runner.result().unwrap().responses.len()
            };
            assert_eq!(recorded, i + 1);
        }

        let payload = runner.result().unwrap();
        let trials: Vec<usize> = payload.responses.iter().map(|r| r.trial).collect();
        assert_eq!(trials, vec![1, 2, 3, 4]);
    }

    #[test]
    fn responses_ignored_when_not_running() {
        let mut runner = TaskRunner::new();
        runner.handle_response(true);
        assert_eq!(runner.phase(), Phase::Idle);

        runner
            .start(&task(false, Some(1)), &pool(3), &Preferences::default())
            .unwrap();
        runner.handle_response(true);
        assert_eq!(runner.phase(), Phase::Finished);

        // Finished: further responses must not grow the record
        runner.handle_response(false);
        assert_eq!(runner.result().unwrap().total_trials, 1);
    }

    #[test]
    fn key_bindings_match_case_insensitively() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, None), &pool(3), &Preferences::default())
            .unwrap();

        assert!(runner.handle_key('F'));
        assert!(runner.handle_key('j'));
        assert!(!runner.handle_key('x'));

        let (current, _) = runner.trial_position();
        assert_eq!(current, 3);
    }

    #[test]
    fn keys_ignored_when_idle() {
        let mut runner = TaskRunner::new();
        assert!(!runner.handle_key('f'));
    }

    #[test]
    fn run_finishes_by_exhaustion_with_single_payload() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, None), &pool(2), &Preferences::default())
            .unwrap();

        runner.handle_response(true);
        runner.handle_response(false);

        assert_eq!(runner.phase(), Phase::Finished);
        // A stale tick after the natural end must not re-fire the end path
        runner.on_tick();
        assert_eq!(runner.phase(), Phase::Finished);

        let payload = runner.take_result().expect("payload emitted once");
        assert_eq!(payload.total_trials, 2);
        assert!(runner.take_result().is_none());
    }

    #[test]
    fn deadline_latches_instead_of_preempting() {
        let (mut runner, clock) = manual_runner();
        runner
            .start(&timed_task(1.0), &pool(5), &Preferences::default())
            .unwrap();

        clock.advance(500);
        runner.on_tick();
        assert_eq!(runner.phase(), Phase::Running);

        clock.advance(700); // 1.2s elapsed
        runner.on_tick();
        assert_eq!(runner.phase(), Phase::TimeUpPending);
        // The current sentence stays answerable
        assert!(runner.current_sentence().is_some());
    }

    #[test]
    fn response_after_deadline_is_recorded_then_run_ends() {
        let (mut runner, clock) = manual_runner();
        runner
            .start(&timed_task(1.0), &pool(5), &Preferences::default())
            .unwrap();

        runner.handle_response(true); // trial 1 before the deadline
        clock.advance(1200);
        runner.on_tick();
        runner.handle_response(true); // grace trial at 1.2s

        assert_eq!(runner.phase(), Phase::Finished);
        let payload = runner.result().unwrap();
        assert_eq!(payload.total_trials, 2);
        assert!(!payload.responses[0].time_limit_reached);
        assert!(payload.responses[1].time_limit_reached);
        assert_eq!(payload.responses[1].time_since_start_ms, 1200);
    }

    #[test]
    fn timer_state_is_cleared_by_reset() {
        let (mut runner, clock) = manual_runner();
        runner
            .start(&timed_task(1.0), &pool(5), &Preferences::default())
            .unwrap();
        clock.advance(5000);
        runner.on_tick();
        assert_eq!(runner.phase(), Phase::TimeUpPending);

        runner.reset();
        assert_eq!(runner.phase(), Phase::Idle);
        assert_eq!(runner.remaining_secs(), None);

        // A fresh untimed run is unaffected by the stale clock value
        runner
            .start(&task(false, None), &pool(2), &Preferences::default())
            .unwrap();
        runner.on_tick();
        assert_eq!(runner.phase(), Phase::Running);
    }

    #[test]
    fn remaining_secs_counts_down() {
        let (mut runner, clock) = manual_runner();
        runner
            .start(&timed_task(2.0), &pool(3), &Preferences::default())
            .unwrap();

        assert_eq!(runner.remaining_secs(), Some(2.0));
        clock.advance(500);
        assert_eq!(runner.remaining_secs(), Some(1.5));
        clock.advance(5000);
        assert_eq!(runner.remaining_secs(), Some(0.0));
    }

    #[test]
    fn untimed_run_reports_no_remaining_time() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, None), &pool(3), &Preferences::default())
            .unwrap();
        assert_eq!(runner.remaining_secs(), None);
    }

    #[test]
    fn elapsed_time_uses_the_injected_clock() {
        let (mut runner, clock) = manual_runner();
        clock.set(10_000); // engine must measure from start, not from zero
        runner
            .start(&task(false, None), &pool(2), &Preferences::default())
            .unwrap();

        clock.advance(340);
        runner.handle_response(true);
        clock.advance(410);
        runner.handle_response(true);

        let payload = runner.result().unwrap();
        assert_eq!(payload.responses[0].time_since_start_ms, 340);
        assert_eq!(payload.responses[1].time_since_start_ms, 750);
    }

    #[test]
    fn payload_carries_task_set_dataset_and_bindings() {
        let mut runner = TaskRunner::new();
        let prefs = Preferences {
            true_key: 'a',
            false_key: 'l',
            active_task_set_id: None,
        };
        runner
            .start(&task(false, Some(1)), &pool(3), &prefs)
            .unwrap();
        runner.handle_response(true);

        let payload = runner.result().unwrap();
        assert_eq!(payload.task_set.id, "task-test");
        assert_eq!(payload.sentence_set.id, "set-test");
        assert_eq!(payload.sentence_set.name, "テスト");
        assert_eq!(payload.preferences.true_key, 'a');
        assert_eq!(payload.preferences.false_key, 'l');
    }

    #[test]
    fn payload_serializes_with_camel_case_contract() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, Some(1)), &pool(1), &Preferences::default())
            .unwrap();
        runner.handle_response(true);

        let json = serde_json::to_value(runner.result().unwrap()).unwrap();
        assert!(json.get("finishedAt").is_some());
        assert!(json.get("taskSet").is_some());
        assert!(json.get("totalTrials").is_some());
        let first = &json["responses"][0];
        assert!(first.get("sentenceId").is_some());
        assert!(first.get("responseTrue").is_some());
        assert!(first.get("timeSinceStartMs").is_some());
        assert!(first.get("timeLimitReached").is_some());
        assert_eq!(json["preferences"]["trueKey"], "f");
    }

    #[test]
    fn summary_aggregates_accuracy_and_tags() {
        let mut runner = TaskRunner::new();
        runner
            .start(&task(false, None), &pool(4), &Preferences::default())
            .unwrap();
        // truths are [true, false, true, false]; answer all true
        for _ in 0..4 {
            runner.handle_response(true);
        }

        let summary = RunSummary::from_payload(runner.result().unwrap());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.accuracy_pct, 50.0);
        assert_eq!(
            summary.per_tag,
            vec![("even".into(), 2, 2), ("odd".into(), 0, 2)]
        );
    }

    #[test]
    fn summary_response_time_stats() {
        let (mut runner, clock) = manual_runner();
        runner
            .start(&task(false, None), &pool(3), &Preferences::default())
            .unwrap();
        for _ in 0..3 {
            clock.advance(200);
            runner.handle_response(true);
        }

        let summary = RunSummary::from_payload(runner.result().unwrap());
        assert_eq!(summary.mean_rt_ms, Some(200.0));
        assert_eq!(summary.sd_rt_ms, Some(0.0));
    }
}
