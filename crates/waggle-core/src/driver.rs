//! Round execution guard and recurring timer.
//!
//! Rounds are triggered from two directions: the recurring timer and the
//! on-demand API endpoint. [`TickDriver`] serializes them with a single
//! atomic flag; a trigger that arrives while a round is in flight is
//! skipped, never queued. Skipping is safe because every round drains
//! whatever quota remains, so a missed trigger costs nothing but time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tracing::{error, info};

use crate::error::SchedulerError;
use crate::scheduler::{ActionScheduler, RoundSummary};

/// What happened when a round was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The round ran to completion.
    Completed(RoundSummary),
    /// Another round was already in flight; this request did nothing.
    Skipped,
}

/// Serializes round execution across the timer and the trigger API.
pub struct TickDriver {
    scheduler: ActionScheduler,
    in_flight: AtomicBool,
    rounds_completed: AtomicU64,
}

impl TickDriver {
    /// Wrap a scheduler in the overlap guard.
    pub fn new(scheduler: ActionScheduler) -> Self {
        Self {
            scheduler,
            in_flight: AtomicBool::new(false),
            rounds_completed: AtomicU64::new(0),
        }
    }

    /// The scheduler being driven.
    pub const fn scheduler(&self) -> &ActionScheduler {
        &self.scheduler
    }

    /// Whether a round is currently executing.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Total rounds completed since process start.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Relaxed)
    }

    /// Run a round now unless one is already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the round itself fails; the guard is
    /// released either way.
    pub async fn try_run_round(&self) -> Result<RoundOutcome, SchedulerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("round already in flight, skipping trigger");
            return Ok(RoundOutcome::Skipped);
        }

        let result = self.scheduler.run_round().await;
        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(summary) => {
                self.rounds_completed.fetch_add(1, Ordering::Relaxed);
                Ok(RoundOutcome::Completed(summary))
            }
            Err(error) => Err(error),
        }
    }

    /// Run rounds forever on a fixed interval, after an initial delay.
    ///
    /// Round failures are logged and the loop keeps going; one bad round
    /// must not stop the simulation.
    pub async fn run_timer_loop(self: Arc<Self>, interval: Duration, startup_delay: Duration) {
        info!(
            interval_secs = interval.as_secs(),
            startup_delay_secs = startup_delay.as_secs(),
            "starting round timer"
        );
        tokio::time::sleep(startup_delay).await;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.try_run_round().await {
                Ok(RoundOutcome::Completed(summary)) => {
                    info!(actions = summary.counts.total(), "timer round completed");
                }
                Ok(RoundOutcome::Skipped) => {}
                Err(err) => {
                    error!(%err, "timer round failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use crate::config::SchedulerConfig;
    use crate::memory::MemoryStore;
    use crate::synth::TemplateSynthesizer;

    use super::*;

    fn driver() -> Arc<TickDriver> {
        let scheduler = ActionScheduler::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TemplateSynthesizer),
            SchedulerConfig::default(),
        );
        Arc::new(TickDriver::new(scheduler))
    }

    #[tokio::test]
    async fn a_round_on_an_idle_driver_completes() {
        let driver = driver();
        let outcome = driver.try_run_round().await.unwrap();
        assert!(matches!(outcome, RoundOutcome::Completed(_)));
        assert_eq!(driver.rounds_completed(), 1);
        assert!(!driver.is_running());
    }

    #[tokio::test]
    async fn concurrent_triggers_skip_instead_of_queueing() {
        let driver = driver();
        // Hold the guard by hand to simulate an in-flight round.
        driver.in_flight.store(true, Ordering::Release);
        let outcome = driver.try_run_round().await.unwrap();
        assert_eq!(outcome, RoundOutcome::Skipped);
        assert_eq!(driver.rounds_completed(), 0);

        driver.in_flight.store(false, Ordering::Release);
        let outcome = driver.try_run_round().await.unwrap();
        assert!(matches!(outcome, RoundOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn guard_is_released_after_completion() {
        let driver = driver();
        for _ in 0..3 {
            let _ = driver.try_run_round().await.unwrap();
        }
        assert_eq!(driver.rounds_completed(), 3);
        assert!(!driver.is_running());
    }
}
