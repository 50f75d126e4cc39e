//! Fixed-cadence cycle driver
//!
//! Cycles start at most once per interval slot, measured from the previous
//! cycle start. A cycle that overruns its slot is followed immediately by
//! exactly one more; missed slots are never replayed in a burst.

use crate::sync::{CycleReport, SyncEngine};
use crate::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Something the scheduler can run once per slot
#[async_trait]
pub trait CycleRunner: Send {
    /// Run one cycle
    async fn run_cycle(&mut self) -> Result<CycleReport>;
}

#[async_trait]
impl CycleRunner for SyncEngine {
    async fn run_cycle(&mut self) -> Result<CycleReport> {
        SyncEngine::run_cycle(self).await
    }
}

/// Drives a [`CycleRunner`] forever on a fixed interval
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval: Duration,
}

impl SyncScheduler {
    /// Create scheduler
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run a cycle now, then once per interval, until `shutdown` resolves.
    ///
    /// Failed cycles are logged and never stop the loop. Returns the number
    /// of cycles run.
    pub async fn run_until<R, S>(&self, runner: &mut R, shutdown: S) -> u64
    where
        R: CycleRunner + ?Sized,
        S: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Starting sync scheduler with {:?} interval", self.interval);

        let mut cycles = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(cycles, "Shutdown requested, stopping sync scheduler");
                    return cycles;
                }
                _ = ticker.tick() => {}
            }

            cycles += 1;
            match runner.run_cycle().await {
                Ok(report) => info!(
                    cycle = cycles,
                    posted = report.posted,
                    skipped = report.skipped,
                    accounts_failed = report.accounts_failed,
                    "Sync cycle finished"
                ),
                Err(e) => error!(cycle = cycles, error = %e, "Error in sync"),
            }

            debug!("Waiting for next sync");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tokio::sync::oneshot;
    use tokio::time::Instant;

    /// Records start times; each cycle takes the next scripted duration
    struct ScriptedRunner {
        durations: Vec<Duration>,
        failing: Vec<usize>,
        starts: Vec<Instant>,
        stop: Option<oneshot::Sender<()>>,
    }

    #[async_trait]
    impl CycleRunner for ScriptedRunner {
        async fn run_cycle(&mut self) -> Result<CycleReport> {
            let n = self.starts.len();
            self.starts.push(Instant::now());
            tokio::time::sleep(self.durations[n]).await;

            if self.starts.len() == self.durations.len() {
                if let Some(stop) = self.stop.take() {
                    let _ = stop.send(());
                }
            }

            if self.failing.contains(&n) {
                Err(Error::Config("scripted failure".to_string()))
            } else {
                Ok(CycleReport::default())
            }
        }
    }

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn run(durations: Vec<Duration>, failing: Vec<usize>) -> (ScriptedRunner, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let runner = ScriptedRunner {
            durations,
            failing,
            starts: Vec::new(),
            stop: Some(tx),
        };
        (runner, rx)
    }

    fn offsets(starts: &[Instant]) -> Vec<Duration> {
        starts.iter().map(|s| *s - starts[0]).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_start_one_interval_apart() {
        let (mut runner, stop) = run(vec![minutes(5), minutes(40), minutes(1)], vec![]);
        let scheduler = SyncScheduler::new(minutes(60));

        let cycles = scheduler
            .run_until(&mut runner, async {
                let _ = stop.await;
            })
            .await;

        assert_eq!(cycles, 3);
        assert_eq!(
            offsets(&runner.starts),
            vec![minutes(0), minutes(60), minutes(120)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_does_not_stack_cycles() {
        let (mut runner, stop) = run(
            vec![minutes(10), minutes(150), minutes(5), minutes(5)],
            vec![],
        );
        let scheduler = SyncScheduler::new(minutes(60));

        scheduler
            .run_until(&mut runner, async {
                let _ = stop.await;
            })
            .await;

        // The overrunning cycle is followed by one immediate cycle, then the
        // cadence resumes from that start.
        assert_eq!(
            offsets(&runner.starts),
            vec![minutes(0), minutes(60), minutes(210), minutes(270)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_keeps_schedule() {
        let (mut runner, stop) = run(vec![minutes(1), minutes(1), minutes(1)], vec![0, 1]);
        let scheduler = SyncScheduler::new(minutes(60));

        let cycles = scheduler
            .run_until(&mut runner, async {
                let _ = stop.await;
            })
            .await;

        assert_eq!(cycles, 3);
        assert_eq!(
            offsets(&runner.starts),
            vec![minutes(0), minutes(60), minutes(120)]
        );
    }
}
