use std::future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::view::QuizPhase;

/// Period of the elapsed-time tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A running tick source. The background task is aborted when this is dropped.
#[derive(Debug)]
pub struct TickSubscription {
    handle: JoinHandle<()>,
    ticks: mpsc::Receiver<()>,
}

impl TickSubscription {
    /// Spawn a task that emits one tick per `period`, the first one `period` from now.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(4);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self { handle, ticks }
    }

    /// Wait for the next tick. Returns `None` once the task has stopped.
    ///
    /// Cancel-safe, so it can sit in a `tokio::select!` arm.
    pub async fn next(&mut self) -> Option<()> {
        self.ticks.recv().await
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Holds a `TickSubscription` exactly while the quiz is in progress.
///
/// Hosts call `sync` after every phase change and `tick` in their event loop;
/// while no subscription is held `tick` never resolves.
#[derive(Debug)]
pub struct ElapsedTicker {
    period: Duration,
    subscription: Option<TickSubscription>,
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ElapsedTicker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            subscription: None,
        }
    }

    /// Start or release the subscription to match `phase`.
    pub fn sync(&mut self, phase: QuizPhase) {
        let wanted = phase == QuizPhase::InProgress;
        match (wanted, self.subscription.is_some()) {
            (true, false) => self.subscription = Some(TickSubscription::start(self.period)),
            (false, true) => self.subscription = None,
            _ => {}
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    /// Release the subscription unconditionally.
    pub fn stop(&mut self) {
        self.subscription = None;
    }

    /// Resolve on the next tick while running; pend forever otherwise.
    pub async fn tick(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            if subscription.next().await.is_some() {
                return;
            }
            self.subscription = None;
        }
        future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizSession;
    use course_core::model::{ChapterId, Question, QuestionDraft, QuizSettings};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session() -> QuizSession {
        let pool = Question::pool_from_drafts(
            (0..2).map(|i| QuestionDraft::new(format!("Q{i}"), ["yes", "no"], 0, "")),
        )
        .unwrap();
        let mut session = QuizSession::new(
            ChapterId::new(1),
            pool,
            QuizSettings::default(),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
        session.load_snapshot(None);
        session
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_while_in_progress() {
        let mut ticker = ElapsedTicker::new();
        ticker.sync(QuizPhase::InProgress);
        let started = Instant::now();

        for _ in 0..3 {
            ticker.tick().await;
        }

        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_ticker_never_resolves() {
        let mut ticker = ElapsedTicker::new();
        ticker.sync(QuizPhase::AwaitingResumeChoice);
        assert!(!ticker.is_running());

        let waited = time::timeout(Duration::from_secs(10), ticker.tick()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_freezes_while_confirming_and_after_completion() {
        let mut session = session();
        let mut ticker = ElapsedTicker::new();
        ticker.sync(session.phase());

        for _ in 0..4 {
            ticker.tick().await;
            session.tick();
        }
        let _ = session.answer(0, 0);
        let _ = session.answer(1, 1);
        assert!(session.request_submit());
        ticker.sync(session.phase());
        assert!(!ticker.is_running());
        assert!(time::timeout(Duration::from_secs(5), ticker.tick()).await.is_err());

        assert!(session.cancel_submit());
        ticker.sync(session.phase());
        ticker.tick().await;
        session.tick();

        assert!(session.request_submit());
        let result = session.confirm_submit().unwrap();
        ticker.sync(session.phase());

        assert_eq!(result.elapsed_seconds, 5);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn sync_is_idempotent() {
        let mut ticker = ElapsedTicker::new();
        ticker.sync(QuizPhase::InProgress);
        let started = Instant::now();
        time::sleep(Duration::from_millis(600)).await;
        // a second sync must not restart the period
        ticker.sync(QuizPhase::InProgress);
        ticker.tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }
}
