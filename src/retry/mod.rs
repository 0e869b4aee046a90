// Retry controller for user-triggered actions
//
// The controller spaces attempts by a cooldown that grows with each failure,
// refuses attempts once `max_retries` consecutive failures have happened and
// allows at most one attempt in flight. It never sleeps: the caller decides
// when to try again, waiting on the controller's clock.

use crate::{log_debug, log_error, log_warn};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

mod clock;
mod config;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RetryConfig;

/// Mutable state owned by one controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// Attempts since the last success or reset
    pub retry_count: u32,
    /// Start time of the last attempt in ms, `None` before the first one
    pub last_retry_time: Option<u64>,
    /// True only while the wrapped action is pending
    pub is_retrying: bool,
    /// Cooldown required after `last_retry_time` before the next attempt
    pub current_delay: Duration,
}

impl RetryState {
    fn initial(config: &RetryConfig) -> Self {
        Self {
            retry_count: 0,
            last_retry_time: None,
            is_retrying: false,
            current_delay: config.retry_delay(),
        }
    }
}

/// Read-only view of the state plus the fields derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySnapshot {
    pub retry_count: u32,
    pub last_retry_time: Option<u64>,
    pub is_retrying: bool,
    pub current_delay: Duration,
    pub can_retry: bool,
    pub remaining_retries: u32,
    pub next_retry_in: Duration,
}

/// Why an attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Another attempt is still pending
    InFlight,
    /// `max_retries` consecutive failures reached
    Exhausted,
    /// The cooldown after the last attempt has not elapsed
    CoolingDown { remaining: Duration },
}

impl Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::InFlight => write!(f, "an attempt is already in flight"),
            BlockReason::Exhausted => write!(f, "maximum number of attempts reached"),
            BlockReason::CoolingDown { remaining } => {
                write!(f, "cooling down, next attempt in {} ms", remaining.as_millis())
            }
        }
    }
}

/// Result of one call to [`RetryController::try_execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Succeeded,
    Failed,
    Blocked(BlockReason),
}

impl RetryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded)
    }
}

/// Clears `is_retrying` when the attempt settles, including when the
/// attempt's future is dropped before completion.
struct InFlightGuard<'a> {
    state: &'a Mutex<RetryState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).is_retrying = false;
    }
}

fn lock(state: &Mutex<RetryState>) -> MutexGuard<'_, RetryState> {
    // The state is plain data; a panic elsewhere cannot leave it torn
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Bounded, spaced retries around an asynchronous action
pub struct RetryController<C: Clock = SystemClock> {
    config: RetryConfig,
    clock: C,
    state: Mutex<RetryState>,
}

impl RetryController<SystemClock> {
    pub fn new(config: RetryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for RetryController<SystemClock> {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl<C: Clock> RetryController<C> {
    pub fn with_clock(config: RetryConfig, clock: C) -> Self {
        Self {
            state: Mutex::new(RetryState::initial(&config)),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The time source cooldowns are measured against
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Delay that follows attempt number `attempt` (1-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        self.config.calculate_delay(attempt)
    }

    fn elapsed_since_last(&self, state: &RetryState) -> Option<Duration> {
        state
            .last_retry_time
            .map(|t| Duration::from_millis(self.clock.now_millis().saturating_sub(t)))
    }

    fn block_reason(&self, state: &RetryState) -> Option<BlockReason> {
        if state.is_retrying {
            return Some(BlockReason::InFlight);
        }
        if state.retry_count >= self.config.max_retries {
            return Some(BlockReason::Exhausted);
        }
        match self.elapsed_since_last(state) {
            Some(elapsed) if elapsed < state.current_delay => Some(BlockReason::CoolingDown {
                remaining: state.current_delay - elapsed,
            }),
            _ => None,
        }
    }

    /// True when attempts remain, the cooldown has elapsed and nothing is in
    /// flight
    pub fn can_execute_retry(&self) -> bool {
        self.block_reason(&lock(&self.state)).is_none()
    }

    /// Current state with derived fields computed against the clock
    pub fn state(&self) -> RetrySnapshot {
        let state = lock(&self.state);
        let next_retry_in = self
            .elapsed_since_last(&state)
            .map(|elapsed| state.current_delay.saturating_sub(elapsed))
            .unwrap_or(Duration::ZERO);

        RetrySnapshot {
            retry_count: state.retry_count,
            last_retry_time: state.last_retry_time,
            is_retrying: state.is_retrying,
            current_delay: state.current_delay,
            can_retry: self.block_reason(&state).is_none(),
            remaining_retries: self.config.max_retries.saturating_sub(state.retry_count),
            next_retry_in,
        }
    }

    /// Runs `action` if an attempt is allowed and reports what happened.
    ///
    /// State is updated before `action` is invoked, so a second call made
    /// while the first is pending is refused with [`BlockReason::InFlight`].
    pub async fn try_execute<F, Fut, E>(&self, action: F) -> RetryOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        let attempt = {
            let mut state = lock(&self.state);
            if let Some(reason) = self.block_reason(&state) {
                log_warn!(
                    "Retry blocked ({}): retry_count={}, max_retries={}, current_delay={}ms",
                    reason,
                    state.retry_count,
                    self.config.max_retries,
                    state.current_delay.as_millis()
                );
                return RetryOutcome::Blocked(reason);
            }

            state.is_retrying = true;
            state.retry_count += 1;
            state.last_retry_time = Some(self.clock.now_millis());
            state.current_delay = self.config.calculate_delay(state.retry_count);
            state.retry_count
        };

        let _guard = InFlightGuard { state: &self.state };
        log_debug!("Starting attempt {}/{}", attempt, self.config.max_retries);

        match action().await {
            Ok(()) => {
                let mut state = lock(&self.state);
                state.retry_count = 0;
                state.current_delay = self.config.retry_delay();
                RetryOutcome::Succeeded
            }
            Err(e) => {
                log_error!("Retry {} failed: {}", attempt, e);
                RetryOutcome::Failed
            }
        }
    }

    /// Boolean form of [`try_execute`](Self::try_execute): true only when the
    /// action ran and succeeded
    pub async fn execute_retry<F, Fut, E>(&self, action: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Display,
    {
        self.try_execute(action).await.is_success()
    }

    /// Back to the initial state. Not meant to be called while an attempt is
    /// pending.
    pub fn reset_retry(&self) {
        *lock(&self.state) = RetryState::initial(&self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const START: u64 = 1_700_000_000_000;

    fn controller(config: RetryConfig) -> (RetryController<ManualClock>, ManualClock) {
        let clock = ManualClock::new(START);
        (RetryController::with_clock(config, clock.clone()), clock)
    }

    async fn fail(calls: &AtomicU32) -> Result<(), String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("boom".to_string())
    }

    async fn succeed(calls: &AtomicU32) -> Result<(), String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    #[test]
    fn initial_state_allows_an_attempt() {
        let (c, _) = controller(RetryConfig::default());
        let s = c.state();
        assert_eq!(s.retry_count, 0);
        assert!(!s.is_retrying);
        assert!(s.can_retry);
        assert_eq!(s.remaining_retries, 3);
        assert_eq!(s.next_retry_in, Duration::ZERO);
        assert!(c.can_execute_retry());
    }

    #[tokio::test]
    async fn success_runs_action_once_and_resets_count() {
        let (c, _) = controller(RetryConfig::default());
        let calls = AtomicU32::new(0);

        assert!(c.execute_retry(|| succeed(&calls)).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.state().retry_count, 0);
        assert_eq!(c.state().current_delay, Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn first_failure_counts_and_sets_base_delay() {
        let (c, _) = controller(RetryConfig::default());
        let calls = AtomicU32::new(0);

        assert!(!c.execute_retry(|| fail(&calls)).await);
        let s = c.state();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.retry_count, 1);
        assert_eq!(s.current_delay, Duration::from_millis(2000));
        assert!(!s.is_retrying);
    }

    #[tokio::test]
    async fn cooldown_blocks_until_delay_has_fully_elapsed() {
        let (c, clock) = controller(RetryConfig::default());
        let calls = AtomicU32::new(0);

        c.execute_retry(|| fail(&calls)).await;
        assert!(!c.can_execute_retry());

        clock.advance(Duration::from_millis(1999));
        assert_eq!(
            c.try_execute(|| fail(&calls)).await,
            RetryOutcome::Blocked(BlockReason::CoolingDown {
                remaining: Duration::from_millis(1)
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.state().retry_count, 1);

        clock.advance(Duration::from_millis(1));
        assert!(c.can_execute_retry());
        assert_eq!(c.state().next_retry_in, Duration::ZERO);
    }

    #[tokio::test]
    async fn next_retry_in_counts_down() {
        let (c, clock) = controller(RetryConfig::default());
        let calls = AtomicU32::new(0);

        c.execute_retry(|| fail(&calls)).await;
        clock.advance(Duration::from_millis(500));
        assert_eq!(c.state().next_retry_in, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn backoff_doubles_then_caps() {
        let config = RetryConfig::new(5)
            .with_retry_delay(Duration::from_millis(1000))
            .with_max_delay(Duration::from_millis(3000));
        let (c, clock) = controller(config);
        let calls = AtomicU32::new(0);

        let mut delays = Vec::new();
        for _ in 0..4 {
            assert!(!c.execute_retry(|| fail(&calls)).await);
            let delay = c.state().current_delay;
            delays.push(delay.as_millis() as u64);
            clock.advance(delay);
        }

        assert_eq!(delays, vec![1000, 2000, 3000, 3000]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn backoff_sequence_with_default_cap() {
        let config = RetryConfig::new(3).with_retry_delay(Duration::from_millis(1000));
        let (c, clock) = controller(config);
        let calls = AtomicU32::new(0);

        c.execute_retry(|| fail(&calls)).await;
        assert_eq!(c.state().current_delay, Duration::from_millis(1000));

        clock.advance(Duration::from_millis(1000));
        c.execute_retry(|| fail(&calls)).await;
        assert_eq!(c.state().current_delay, Duration::from_millis(2000));

        clock.advance(Duration::from_millis(2000));
        c.execute_retry(|| fail(&calls)).await;
        assert_eq!(c.state().current_delay, Duration::from_millis(4000));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_retries() {
        let (c, clock) = controller(RetryConfig::new(2));
        let calls = AtomicU32::new(0);

        c.execute_retry(|| fail(&calls)).await;
        clock.advance(c.state().current_delay);
        assert!(c.can_execute_retry());

        c.execute_retry(|| fail(&calls)).await;
        clock.advance(Duration::from_secs(60));
        assert!(!c.can_execute_retry());
        assert_eq!(c.state().remaining_retries, 0);

        assert_eq!(
            c.try_execute(|| fail(&calls)).await,
            RetryOutcome::Blocked(BlockReason::Exhausted)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn remaining_retries_decrease_per_failure() {
        let (c, clock) = controller(RetryConfig::new(3));
        let calls = AtomicU32::new(0);

        assert_eq!(c.state().remaining_retries, 3);
        for expected in [2, 1, 0] {
            c.execute_retry(|| fail(&calls)).await;
            assert_eq!(c.state().remaining_retries, expected);
            clock.advance(c.state().current_delay);
        }
    }

    #[tokio::test]
    async fn success_after_failures_restores_base_delay() {
        let config = RetryConfig::new(5).with_retry_delay(Duration::from_millis(1000));
        let (c, clock) = controller(config);
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            c.execute_retry(|| fail(&calls)).await;
            clock.advance(c.state().current_delay);
        }
        assert_eq!(c.state().current_delay, Duration::from_millis(4000));

        assert!(c.execute_retry(|| succeed(&calls)).await);
        let s = c.state();
        assert_eq!(s.retry_count, 0);
        assert_eq!(s.current_delay, Duration::from_millis(1000));
        assert_eq!(s.remaining_retries, 5);
    }

    #[tokio::test]
    async fn simultaneous_calls_run_the_action_once() {
        let (c, _) = controller(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let slow = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<(), String>(())
        };
        let (first, second) = tokio::join!(c.try_execute(slow), c.try_execute(slow));

        assert_eq!(first, RetryOutcome::Succeeded);
        assert_eq!(second, RetryOutcome::Blocked(BlockReason::InFlight));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn is_retrying_only_while_action_is_pending() {
        let (c, _) = controller(RetryConfig::default());
        let ctl = &c;

        let seen = c
            .execute_retry(move || async move {
                assert!(ctl.state().is_retrying);
                assert!(!ctl.can_execute_retry());
                Err::<(), _>("still failing")
            })
            .await;

        assert!(!seen);
        assert!(!c.state().is_retrying);
        assert_eq!(c.state().retry_count, 1);
    }

    #[tokio::test]
    async fn dropping_a_pending_attempt_clears_in_flight() {
        let (c, clock) = controller(RetryConfig::default());

        {
            let pending = c.execute_retry(|| std::future::pending::<Result<(), String>>());
            tokio::pin!(pending);
            let polled = poll_once(pending.as_mut()).await;
            assert!(polled.is_none());
            assert!(c.state().is_retrying);
        }

        assert!(!c.state().is_retrying);
        clock.advance(Duration::from_millis(2000));
        assert!(c.can_execute_retry());
    }

    /// Polls a future exactly once
    async fn poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
        let mut fut = fut;
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut fut).poll(cx) {
                std::task::Poll::Ready(v) => Some(v),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }

    #[tokio::test]
    async fn reset_restores_initial_state_from_any_point() {
        let (c, _) = controller(RetryConfig::new(2));
        let calls = AtomicU32::new(0);

        c.execute_retry(|| fail(&calls)).await;
        c.execute_retry(|| fail(&calls)).await;
        assert_eq!(c.state().retry_count, 1);

        c.reset_retry();
        let s = c.state();
        assert_eq!(s.retry_count, 0);
        assert!(!s.is_retrying);
        assert!(s.can_retry);
        assert_eq!(s.current_delay, Duration::from_millis(2000));
        assert_eq!(s.last_retry_time, None);
    }

    #[tokio::test]
    async fn blocked_call_does_not_touch_state() {
        let (c, _) = controller(RetryConfig::default());
        let calls = AtomicU32::new(0);

        c.execute_retry(|| fail(&calls)).await;
        let before = c.state();
        assert!(!c.execute_retry(|| succeed(&calls)).await);
        assert_eq!(c.state(), before);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
