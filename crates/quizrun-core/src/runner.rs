//! The quiz session state machine.
//!
//! ```text
//! Browsing --select_quiz--> InProgress --submit / expiry--> Completed --reset--> Browsing
//!                               |
//!                               +--abandon--> Browsing
//! ```
//!
//! Manual submission and timer expiry share one completion path. It is
//! guarded by the `InProgress` check, so whichever trigger arrives first wins
//! and the other is a no-op.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::AnswerStore;
use crate::error::QuizError;
use crate::model::{Question, QuizDefinition, ScoreResult, TakerContext};
use crate::record::AttemptRecord;
use crate::scoring;
use crate::timer::{SessionId, SessionTimer, TimerEvent, TimerEventKind, TimerSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Browsing,
    InProgress,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Browsing => write!(f, "browsing"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::Completed => write!(f, "completed"),
        }
    }
}

/// What ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTrigger {
    Manual,
    Expired,
}

impl fmt::Display for CompletionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionTrigger::Manual => write!(f, "submitted"),
            CompletionTrigger::Expired => write!(f, "time expired"),
        }
    }
}

/// One attempt at a quiz. Read-only once completed.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    quiz: QuizDefinition,
    current_index: usize,
    answers: AnswerStore,
    remaining_secs: u32,
    state: SessionState,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    completion: Option<CompletionTrigger>,
    result: Option<ScoreResult>,
}

impl Session {
    fn new(quiz: QuizDefinition, time_limit: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz,
            current_index: 0,
            answers: AnswerStore::new(),
            remaining_secs: time_limit,
            state: SessionState::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            completion: None,
            result: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn completion(&self) -> Option<CompletionTrigger> {
        self.completion
    }

    pub fn result(&self) -> Option<ScoreResult> {
        self.result
    }

    pub fn total_count(&self) -> usize {
        self.quiz.total_count()
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions[self.current_index]
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.total_count()
    }
}

/// Result of feeding a timer event to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerUpdate {
    /// Stale event, or the session is no longer in progress.
    Ignored,
    Ticked(u32),
    Completed(ScoreResult),
}

/// Drives one quiz session at a time.
pub struct QuizRunner {
    taker: TakerContext,
    timer: Box<dyn SessionTimer>,
    events: TimerSender,
    session: Option<Session>,
}

impl QuizRunner {
    /// `events` is the sending half of the channel the caller's loop drains
    /// into `handle_timer_event`.
    pub fn new(taker: TakerContext, timer: Box<dyn SessionTimer>, events: TimerSender) -> Self {
        Self {
            taker,
            timer,
            events,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Browsing, |s| s.state)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().map(Session::current_question)
    }

    pub fn result(&self) -> Option<ScoreResult> {
        self.session.as_ref().and_then(|s| s.result)
    }

    /// Start a session for `quiz`.
    ///
    /// The definition is validated first; on failure the runner stays in
    /// `Browsing` and no session is constructed.
    pub fn select_quiz(&mut self, quiz: QuizDefinition) -> Result<&Session, QuizError> {
        let state = self.state();
        if state != SessionState::Browsing {
            return Err(QuizError::InvalidTransition {
                action: "select a quiz",
                state,
            });
        }
        let time_limit = match quiz.validate().and_then(|()| quiz.checked_time_limit()) {
            Ok(secs) => secs,
            Err(e) => {
                tracing::warn!(quiz_id = %quiz.id, "rejected quiz: {e}");
                return Err(e);
            }
        };

        let session = Session::new(quiz, time_limit);
        tracing::info!(
            session = %session.id,
            quiz_id = %session.quiz.id,
            taker = %self.taker.taker_id,
            questions = session.total_count(),
            time_limit_secs = session.quiz.time_limit_secs,
            "quiz session started"
        );
        self.timer
            .start(session.id, session.remaining_secs, self.events.clone());
        Ok(self.session.insert(session))
    }

    /// Record `value` as the answer to the current question.
    pub fn answer(&mut self, value: impl Into<String>) -> Result<(), QuizError> {
        let session = self.in_progress_mut("answer")?;
        let index = session.current_index;
        session.answers.set(index, value);
        Ok(())
    }

    /// Move to the next question. Returns whether the index moved.
    pub fn next(&mut self) -> bool {
        match self.in_progress_mut("navigate") {
            Ok(session) if !session.is_last() => {
                session.current_index += 1;
                true
            }
            _ => false,
        }
    }

    /// Move to the previous question. Returns whether the index moved.
    pub fn previous(&mut self) -> bool {
        match self.in_progress_mut("navigate") {
            Ok(session) if session.current_index > 0 => {
                session.current_index -= 1;
                true
            }
            _ => false,
        }
    }

    /// Jump to question `index`; out-of-range targets are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        match self.in_progress_mut("navigate") {
            Ok(session) if index < session.total_count() && index != session.current_index => {
                session.current_index = index;
                true
            }
            _ => false,
        }
    }

    /// Submit the attempt.
    ///
    /// Returns the score only for the call that performs the transition.
    pub fn submit(&mut self) -> Option<ScoreResult> {
        self.complete(CompletionTrigger::Manual)
    }

    /// Apply one event from the session timer.
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> RunnerUpdate {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(session = %event.session, "timer event with no session");
            return RunnerUpdate::Ignored;
        };
        if session.id != event.session || session.state != SessionState::InProgress {
            tracing::debug!(session = %event.session, "ignoring stale timer event");
            return RunnerUpdate::Ignored;
        }

        match event.kind {
            TimerEventKind::Tick(remaining) => {
                session.remaining_secs = session.remaining_secs.min(remaining);
                RunnerUpdate::Ticked(session.remaining_secs)
            }
            TimerEventKind::Expired => self
                .complete(CompletionTrigger::Expired)
                .map_or(RunnerUpdate::Ignored, RunnerUpdate::Completed),
        }
    }

    /// Leave an in-progress session without scoring it.
    pub fn abandon(&mut self) -> Result<(), QuizError> {
        let session = self.in_progress_mut("abandon")?;
        let id = session.id;
        self.timer.cancel();
        self.session = None;
        tracing::info!(session = %id, "quiz session abandoned");
        Ok(())
    }

    /// Discard a completed session and return to browsing.
    pub fn reset(&mut self) -> Result<(), QuizError> {
        match self.state() {
            SessionState::Browsing => Ok(()),
            SessionState::Completed => {
                self.session = None;
                Ok(())
            }
            state @ SessionState::InProgress => Err(QuizError::InvalidTransition {
                action: "reset",
                state,
            }),
        }
    }

    /// The finished attempt, once the session is completed.
    pub fn attempt_record(&self) -> Option<AttemptRecord> {
        self.session
            .as_ref()
            .and_then(|s| AttemptRecord::from_session(s, &self.taker))
    }

    fn in_progress_mut(&mut self, action: &'static str) -> Result<&mut Session, QuizError> {
        let state = self.state();
        match self.session.as_mut() {
            Some(session) if session.state == SessionState::InProgress => Ok(session),
            _ => Err(QuizError::InvalidTransition { action, state }),
        }
    }

    /// The single path out of `InProgress` that scores the attempt.
    fn complete(&mut self, trigger: CompletionTrigger) -> Option<ScoreResult> {
        let session = self.session.as_mut()?;
        if session.state != SessionState::InProgress {
            return None;
        }

        self.timer.cancel();
        let result = scoring::score(&session.quiz, &session.answers.snapshot());
        if trigger == CompletionTrigger::Expired {
            session.remaining_secs = 0;
        }
        session.state = SessionState::Completed;
        session.completion = Some(trigger);
        session.completed_at = Some(Utc::now());
        session.result = Some(result);

        tracing::info!(
            session = %session.id,
            quiz_id = %session.quiz.id,
            %trigger,
            correct = result.correct_count,
            total = result.total_count,
            percentage = result.percentage,
            "quiz session completed"
        );
        Some(result)
    }
}

impl Drop for QuizRunner {
    fn drop(&mut self) {
        if self.state() == SessionState::InProgress {
            self.timer.cancel();
        }
    }
}

impl fmt::Debug for QuizRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizRunner")
            .field("taker", &self.taker)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DefinitionProblem;
    use crate::model::fixtures::abc_quiz;
    use crate::timer::{ManualTimer, TokioTimer};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn runner() -> (QuizRunner, ManualTimer, UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = unbounded_channel();
        let timer = ManualTimer::new();
        let runner = QuizRunner::new(
            TakerContext::new("student-7", "5A"),
            Box::new(timer.clone()),
            tx,
        );
        (runner, timer, rx)
    }

    fn pump(runner: &mut QuizRunner, rx: &mut UnboundedReceiver<TimerEvent>) -> Vec<RunnerUpdate> {
        let mut updates = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            updates.push(runner.handle_timer_event(ev));
        }
        updates
    }

    #[test]
    fn starts_in_browsing() {
        let (runner, timer, _rx) = runner();
        assert_eq!(runner.state(), SessionState::Browsing);
        assert!(runner.session().is_none());
        assert_eq!(timer.start_count(), 0);
    }

    #[test]
    fn select_quiz_creates_fresh_session() {
        let (mut runner, timer, mut rx) = runner();
        let session = runner.select_quiz(abc_quiz(30)).unwrap();
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.remaining_secs(), 30);

        assert_eq!(runner.state(), SessionState::InProgress);
        assert!(timer.is_running());
        assert_eq!(pump(&mut runner, &mut rx), vec![RunnerUpdate::Ticked(30)]);
    }

    #[test]
    fn empty_quiz_is_rejected_and_stays_browsing() {
        let (mut runner, timer, _rx) = runner();
        let mut quiz = abc_quiz(30);
        quiz.questions.clear();

        let err = runner.select_quiz(quiz).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidQuizDefinition {
                problem: DefinitionProblem::NoQuestions,
                ..
            }
        ));
        assert_eq!(runner.state(), SessionState::Browsing);
        assert!(runner.session().is_none());
        assert_eq!(timer.start_count(), 0);
    }

    #[test]
    fn oversized_time_limit_is_rejected() {
        let (mut runner, timer, _rx) = runner();
        let err = runner
            .select_quiz(abc_quiz(i64::from(u32::MAX) + 10))
            .unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidQuizDefinition {
                problem: DefinitionProblem::TimeLimitTooLong(_),
                ..
            }
        ));
        assert_eq!(runner.state(), SessionState::Browsing);
        assert_eq!(timer.start_count(), 0);
    }

    #[test]
    fn cannot_select_while_in_progress() {
        let (mut runner, _timer, _rx) = runner();
        runner.select_quiz(abc_quiz(30)).unwrap();
        let err = runner.select_quiz(abc_quiz(30)).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidTransition {
                state: SessionState::InProgress,
                ..
            }
        ));
    }

    #[test]
    fn navigation_is_bounded() {
        let (mut runner, _timer, _rx) = runner();
        runner.select_quiz(abc_quiz(30)).unwrap();

        assert!(!runner.previous());
        assert_eq!(runner.session().unwrap().current_index(), 0);

        assert!(runner.next());
        assert!(runner.next());
        assert!(!runner.next());
        assert!(!runner.next());
        assert_eq!(runner.session().unwrap().current_index(), 2);

        assert!(runner.previous());
        assert_eq!(runner.session().unwrap().current_index(), 1);

        assert!(runner.go_to(0));
        assert!(!runner.go_to(3));
        assert_eq!(runner.session().unwrap().current_index(), 0);
    }

    #[test]
    fn navigation_outside_a_session_is_a_no_op() {
        let (mut runner, _timer, _rx) = runner();
        assert!(!runner.next());
        assert!(!runner.previous());
        assert!(runner.submit().is_none());
    }

    #[test]
    fn answers_follow_current_index_and_can_be_revised() {
        let (mut runner, _timer, _rx) = runner();
        runner.select_quiz(abc_quiz(30)).unwrap();

        runner.answer("B").unwrap();
        runner.answer("A").unwrap();
        runner.next();
        runner.answer("X").unwrap();

        let answers = runner.session().unwrap().answers();
        assert_eq!(answers.get(0), Some("A"));
        assert_eq!(answers.get(1), Some("X"));
        assert!(answers.get(2).is_none());
    }

    #[test]
    fn manual_submit_scores_two_of_three() {
        let (mut runner, timer, _rx) = runner();
        runner.select_quiz(abc_quiz(30)).unwrap();
        for answer in ["A", "X", "C"] {
            runner.answer(answer).unwrap();
            runner.next();
        }

        let result = runner.submit().unwrap();
        assert_eq!(result, ScoreResult::new(2, 3));
        assert_eq!(result.percentage, 67);
        assert_eq!(runner.state(), SessionState::Completed);
        assert_eq!(
            runner.session().unwrap().completion(),
            Some(CompletionTrigger::Manual)
        );
        assert!(!timer.is_running());
    }

    #[test]
    fn double_submit_completes_once() {
        let (mut runner, timer, _rx) = runner();
        runner.select_quiz(abc_quiz(30)).unwrap();
        runner.answer("A").unwrap();

        let first = runner.submit();
        let second = runner.submit();
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(runner.result(), first);
        assert_eq!(timer.cancel_count(), 1);
    }

    #[test]
    fn expiry_after_manual_submit_is_absorbed() {
        let (mut runner, _timer, mut rx) = runner();
        let id = runner.select_quiz(abc_quiz(1)).unwrap().id();
        runner.answer("A").unwrap();
        let submitted = runner.submit().unwrap();

        // Expiry raced in during the same loop turn.
        let update = runner.handle_timer_event(TimerEvent {
            session: id,
            kind: TimerEventKind::Expired,
        });
        assert_eq!(update, RunnerUpdate::Ignored);
        assert!(pump(&mut runner, &mut rx)
            .iter()
            .all(|u| !matches!(u, RunnerUpdate::Completed(_))));
        assert_eq!(runner.result(), Some(submitted));
        assert_eq!(
            runner.session().unwrap().completion(),
            Some(CompletionTrigger::Manual)
        );
    }

    #[test]
    fn expiry_after_five_ticks_completes_with_current_answers() {
        let (mut runner, timer, mut rx) = runner();
        runner.select_quiz(abc_quiz(5)).unwrap();
        runner.answer("A").unwrap();
        runner.next();
        runner.answer("B").unwrap();

        let mut completions = Vec::new();
        for _ in 0..5 {
            timer.advance(1);
            for update in pump(&mut runner, &mut rx) {
                if let RunnerUpdate::Completed(result) = update {
                    completions.push(result);
                }
            }
        }

        assert_eq!(runner.state(), SessionState::Completed);
        assert_eq!(completions, vec![ScoreResult::new(2, 3)]);
        let session = runner.session().unwrap();
        assert_eq!(session.completion(), Some(CompletionTrigger::Expired));
        assert_eq!(session.remaining_secs(), 0);
    }

    #[test]
    fn remaining_seconds_never_increase() {
        let (mut runner, timer, mut rx) = runner();
        let id = runner.select_quiz(abc_quiz(10)).unwrap().id();
        timer.advance(3);
        pump(&mut runner, &mut rx);
        assert_eq!(runner.session().unwrap().remaining_secs(), 7);

        let update = runner.handle_timer_event(TimerEvent {
            session: id,
            kind: TimerEventKind::Tick(9),
        });
        assert_eq!(update, RunnerUpdate::Ticked(7));
    }

    #[test]
    fn zero_time_limit_expires_on_first_pump() {
        let (mut runner, _timer, mut rx) = runner();
        runner.select_quiz(abc_quiz(0)).unwrap();
        assert_eq!(runner.state(), SessionState::InProgress);

        let updates = pump(&mut runner, &mut rx);
        assert_eq!(updates, vec![RunnerUpdate::Completed(ScoreResult::new(0, 3))]);
    }

    #[test]
    fn completed_session_is_read_only() {
        let (mut runner, timer, mut rx) = runner();
        runner.select_quiz(abc_quiz(10)).unwrap();
        runner.answer("A").unwrap();
        runner.submit();
        let remaining = runner.session().unwrap().remaining_secs();

        assert!(matches!(
            runner.answer("B"),
            Err(QuizError::InvalidTransition {
                state: SessionState::Completed,
                ..
            })
        ));
        assert!(!runner.next());
        timer.advance(3);
        assert!(pump(&mut runner, &mut rx)
            .iter()
            .all(|u| *u == RunnerUpdate::Ignored));

        let session = runner.session().unwrap();
        assert_eq!(session.answers().get(0), Some("A"));
        assert_eq!(session.remaining_secs(), remaining);
    }

    #[test]
    fn reset_returns_to_browsing_only_from_completed() {
        let (mut runner, _timer, _rx) = runner();
        assert!(runner.reset().is_ok());

        runner.select_quiz(abc_quiz(10)).unwrap();
        assert!(runner.reset().is_err());

        runner.submit();
        runner.reset().unwrap();
        assert_eq!(runner.state(), SessionState::Browsing);
        assert!(runner.session().is_none());
    }

    #[test]
    fn abandon_cancels_timer_and_drops_stale_events() {
        let (mut runner, timer, mut rx) = runner();
        runner.select_quiz(abc_quiz(10)).unwrap();
        runner.abandon().unwrap();
        assert_eq!(runner.state(), SessionState::Browsing);
        assert!(!timer.is_running());

        // A new session must not see the previous one's queued tick.
        runner.select_quiz(abc_quiz(20)).unwrap();
        let updates = pump(&mut runner, &mut rx);
        assert_eq!(updates, vec![RunnerUpdate::Ignored, RunnerUpdate::Ticked(20)]);
    }

    #[test]
    fn dropping_runner_cancels_timer() {
        let (mut runner, timer, _rx) = runner();
        runner.select_quiz(abc_quiz(10)).unwrap();
        drop(runner);
        assert!(!timer.is_running());
    }

    #[test]
    fn attempt_record_available_after_completion() {
        let (mut runner, _timer, _rx) = runner();
        runner.select_quiz(abc_quiz(10)).unwrap();
        assert!(runner.attempt_record().is_none());
        runner.answer("A").unwrap();
        runner.submit();

        let record = runner.attempt_record().unwrap();
        assert_eq!(record.quiz_id, "abc");
        assert_eq!(record.taker_id, "student-7");
        assert_eq!(record.result.correct_count, 1);
        assert_eq!(record.responses.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_drives_session_to_expiry() {
        let (tx, mut rx) = unbounded_channel();
        let mut runner = QuizRunner::new(
            TakerContext::new("student-7", "5A"),
            Box::new(TokioTimer::new()),
            tx,
        );
        runner.select_quiz(abc_quiz(3)).unwrap();
        runner.answer("A").unwrap();

        let mut last = RunnerUpdate::Ignored;
        while runner.state() == SessionState::InProgress {
            let ev = rx.recv().await.unwrap();
            last = runner.handle_timer_event(ev);
        }
        assert_eq!(last, RunnerUpdate::Completed(ScoreResult::new(1, 3)));
    }
}
