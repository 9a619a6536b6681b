//! Session countdown timers.
//!
//! A timer reports progress by sending `TimerEvent`s into a channel owned by
//! the UI loop. The loop hands each event to `QuizRunner::handle_timer_event`
//! one at a time, so delivery is strictly sequential and never re-entrant.
//!
//! Schedule for a duration of `N > 0` seconds: `Tick(N)` at start, then
//! `Tick(N-1)` .. `Tick(1)` once per elapsed second, then `Expired` when the
//! count reaches zero. A duration of zero produces a single queued `Expired`
//! and no ticks.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Identifies the session a timer belongs to.
pub type SessionId = Uuid;

/// Channel half a timer delivers into.
pub type TimerSender = UnboundedSender<TimerEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub session: SessionId,
    pub kind: TimerEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEventKind {
    /// Seconds still remaining.
    Tick(u32),
    Expired,
}

/// A countdown bound to one session.
pub trait SessionTimer: Send {
    /// Begin counting down `duration_secs`, replacing any countdown in flight.
    fn start(&mut self, session: SessionId, duration_secs: u32, events: TimerSender);

    /// Stop delivering events. Idempotent.
    fn cancel(&mut self);
}

fn send(events: &TimerSender, session: SessionId, kind: TimerEventKind) -> bool {
    events.send(TimerEvent { session, kind }).is_ok()
}

// ---------------------------------------------------------------------------
// Tokio interval timer
// ---------------------------------------------------------------------------

/// Wall-clock timer driven by `tokio::time::interval` on a spawned task.
///
/// Must be started from within a Tokio runtime.
#[derive(Debug)]
pub struct TokioTimer {
    task: Option<JoinHandle<()>>,
}

const TICK_PERIOD: Duration = Duration::from_secs(1);

impl TokioTimer {
    pub fn new() -> Self {
        Self { task: None }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTimer for TokioTimer {
    fn start(&mut self, session: SessionId, duration_secs: u32, events: TimerSender) {
        self.cancel();

        self.task = Some(tokio::spawn(async move {
            if duration_secs == 0 {
                send(&events, session, TimerEventKind::Expired);
                return;
            }

            let mut remaining = duration_secs;
            let mut interval = tokio::time::interval(TICK_PERIOD);
            // The first tick completes immediately.
            interval.tick().await;
            if !send(&events, session, TimerEventKind::Tick(remaining)) {
                return;
            }

            loop {
                interval.tick().await;
                remaining -= 1;
                if remaining == 0 {
                    send(&events, session, TimerEventKind::Expired);
                    return;
                }
                if !send(&events, session, TimerEventKind::Tick(remaining)) {
                    return;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Manual timer
// ---------------------------------------------------------------------------

/// Deterministic timer advanced by hand.
///
/// Clones share state, so a test can keep one handle while the runner owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    armed: Option<Armed>,
    starts: u32,
    cancels: u32,
}

#[derive(Debug)]
struct Armed {
    session: SessionId,
    remaining: u32,
    events: TimerSender,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate `secs` elapsed seconds.
    pub fn advance(&self, secs: u32) {
        let mut state = self.state();
        for _ in 0..secs {
            let Some(armed) = state.armed.as_mut() else {
                return;
            };
            armed.remaining -= 1;
            if armed.remaining == 0 {
                send(&armed.events, armed.session, TimerEventKind::Expired);
                state.armed = None;
            } else {
                send(&armed.events, armed.session, TimerEventKind::Tick(armed.remaining));
            }
        }
    }

    /// Whether a countdown is in flight.
    pub fn is_running(&self) -> bool {
        self.state().armed.is_some()
    }

    pub fn start_count(&self) -> u32 {
        self.state().starts
    }

    pub fn cancel_count(&self) -> u32 {
        self.state().cancels
    }
}

impl SessionTimer for ManualTimer {
    fn start(&mut self, session: SessionId, duration_secs: u32, events: TimerSender) {
        let mut state = self.state();
        state.starts += 1;
        state.armed = None;

        if duration_secs == 0 {
            send(&events, session, TimerEventKind::Expired);
            return;
        }

        let remaining = duration_secs;
        send(&events, session, TimerEventKind::Tick(remaining));
        state.armed = Some(Armed {
            session,
            remaining,
            events,
        });
    }

    fn cancel(&mut self) {
        let mut state = self.state();
        state.cancels += 1;
        state.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn drain(rx: &mut UnboundedReceiver<TimerEvent>) -> Vec<TimerEventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[test]
    fn manual_zero_duration_expires_without_ticks() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = ManualTimer::new();
        timer.start(Uuid::new_v4(), 0, tx);

        assert_eq!(drain(&mut rx), vec![TimerEventKind::Expired]);
        timer.advance(3);
        assert!(drain(&mut rx).is_empty());
        assert!(!timer.is_running());
    }

    #[test]
    fn manual_counts_down_then_expires_once() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = ManualTimer::new();
        timer.start(Uuid::new_v4(), 3, tx);
        timer.advance(10);

        assert_eq!(
            drain(&mut rx),
            vec![
                TimerEventKind::Tick(3),
                TimerEventKind::Tick(2),
                TimerEventKind::Tick(1),
                TimerEventKind::Expired,
            ]
        );
    }

    #[test]
    fn manual_cancel_is_idempotent() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = ManualTimer::new();
        timer.start(Uuid::new_v4(), 5, tx);
        timer.cancel();
        timer.cancel();
        timer.advance(5);

        assert_eq!(drain(&mut rx), vec![TimerEventKind::Tick(5)]);
        assert_eq!(timer.cancel_count(), 2);
    }

    #[test]
    fn manual_events_carry_session_id() {
        let (tx, mut rx) = unbounded_channel();
        let session = Uuid::new_v4();
        let mut timer = ManualTimer::new();
        timer.start(session, 2, tx);
        timer.advance(1);

        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.session, session);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_zero_duration_expires_without_ticks() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = TokioTimer::new();
        timer.start(Uuid::new_v4(), 0, tx);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, TimerEventKind::Expired);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_ticks_each_second() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = TokioTimer::new();
        timer.start(Uuid::new_v4(), 3, tx);

        let mut kinds = Vec::new();
        while let Some(ev) = rx.recv().await {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                TimerEventKind::Tick(3),
                TimerEventKind::Tick(2),
                TimerEventKind::Tick(1),
                TimerEventKind::Expired,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_expires_after_full_duration() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = TokioTimer::new();
        let started = tokio::time::Instant::now();
        timer.start(Uuid::new_v4(), 4, tx);

        let mut last = None;
        while let Some(ev) = rx.recv().await {
            last = Some((ev.kind, started.elapsed()));
        }
        assert_eq!(
            last,
            Some((TimerEventKind::Expired, Duration::from_secs(4)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_cancel_stops_delivery() {
        let (tx, mut rx) = unbounded_channel();
        let mut timer = TokioTimer::new();
        timer.start(Uuid::new_v4(), 10, tx);

        assert_eq!(rx.recv().await.unwrap().kind, TimerEventKind::Tick(10));
        timer.cancel();
        timer.cancel();

        // Aborting the task drops the sender, closing the channel.
        assert!(rx.recv().await.is_none());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_restart_replaces_previous_countdown() {
        let (tx, mut rx) = unbounded_channel();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut timer = TokioTimer::new();

        timer.start(first, 100, tx.clone());
        assert_eq!(rx.recv().await.unwrap().session, first);
        timer.start(second, 1, tx);

        let mut sessions = Vec::new();
        while let Some(ev) = rx.recv().await {
            sessions.push(ev.session);
        }
        assert!(sessions.iter().all(|s| *s == second));
        assert_eq!(sessions.len(), 2);
    }
}
