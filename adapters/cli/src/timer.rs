//! Periodic task that feeds countdown ticks into the session.

use std::time::Duration;

use courtside_core::Command;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::debug;

/// Owns the background task that emits `Command::Tick` once per period.
#[derive(Debug)]
pub(crate) struct TimerDriver {
    period: Duration,
    ticks: mpsc::Sender<Command>,
    task: Option<JoinHandle<()>>,
}

impl TimerDriver {
    pub(crate) fn new(period: Duration, ticks: mpsc::Sender<Command>) -> Self {
        Self {
            period,
            ticks,
            task: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawns the tick task; returns `false` when one is already running.
    pub(crate) fn start(&mut self) -> bool {
        if self.task.is_some() {
            return false;
        }

        let period = self.period;
        let ticks = self.ticks.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            loop {
                let _ = interval.tick().await;
                if ticks.send(Command::Tick { dt: period }).await.is_err() {
                    break;
                }
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "timer task started");
        true
    }

    /// Stops the tick task and waits until it has fully shut down.
    pub(crate) async fn pause(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            debug!("timer task stopped");
        }
    }
}

/// Schedules winner-banner expiry notices; only the latest one counts.
#[derive(Debug)]
pub(crate) struct BannerExpiry {
    delay: Duration,
    generation: u64,
    notices: mpsc::Sender<u64>,
}

impl BannerExpiry {
    pub(crate) fn new(delay: Duration, notices: mpsc::Sender<u64>) -> Self {
        Self {
            delay,
            generation: 0,
            notices,
        }
    }

    /// Starts a fresh countdown for the banner, superseding earlier ones.
    pub(crate) fn schedule(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let delay = self.delay;
        let notices = self.notices.clone();
        let _detached = tokio::spawn(async move {
            time::sleep(delay).await;
            if notices.send(generation).await.is_err() {
                debug!(generation, "banner expiry dropped after shutdown");
            }
        });
    }

    /// Reports whether a received notice belongs to the latest banner.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
