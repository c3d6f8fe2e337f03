//! Periodic driver for the publish task.
//!
//! The task itself never retries or logs failures; both are decided here.
//! A failed tick is logged and the next tick simply tries again.

use crate::task::{PublishOutcome, SensorPublishTask};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// How often and how many times to invoke the task.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleSettings {
    pub interval: Duration,
    /// Stop after this many invocations; `None` runs until aborted.
    pub max_runs: Option<u64>,
}

/// Counts of invocation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub published: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl ScheduleReport {
    pub fn runs(&self) -> u64 {
        self.published + self.skipped + self.failed
    }
}

/// Spawn a task that invokes `task.execute()` once per interval.
///
/// The first invocation happens immediately. Ticks missed while a publish is
/// in flight are delayed rather than bursted.
///
/// # Returns
///
/// A `JoinHandle` resolving to the outcome counts once `max_runs` is reached.
/// Abort it to stop an unbounded schedule.
pub fn spawn_publish_loop(
    task: Arc<SensorPublishTask>,
    settings: ScheduleSettings,
) -> JoinHandle<ScheduleReport> {
    tokio::spawn(async move {
        let mut ticker = interval(settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut report = ScheduleReport::default();

        while settings.max_runs.is_none_or(|max| report.runs() < max) {
            ticker.tick().await;
            match task.execute().await {
                Ok(PublishOutcome::Published(reading)) => {
                    report.published += 1;
                    info!("[Sensor] {} = {}", task.topic(), reading);
                }
                Ok(PublishOutcome::Skipped) => {
                    report.skipped += 1;
                    debug!("[Sensor] Broker not connected, reading skipped");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("[Sensor] {}", e);
                }
            }
        }

        info!(
            "[Sensor] Schedule finished: {} published, {} skipped, {} failed",
            report.published, report.skipped, report.failed
        );
        report
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedSequence;
    use crate::testing::RecordingClient;
    use std::io;

    fn settings(max_runs: u64) -> ScheduleSettings {
        ScheduleSettings {
            interval: Duration::from_millis(10),
            max_runs: Some(max_runs),
        }
    }

    fn task(client: Arc<RecordingClient>) -> Arc<SensorPublishTask> {
        Arc::new(SensorPublishTask::new(
            client,
            Arc::new(FixedSequence::new(vec![0.1, 0.6])),
            "engine/temperature",
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_max() {
        let client = Arc::new(RecordingClient::new(true));
        let report = spawn_publish_loop(task(client.clone()), settings(5))
            .await
            .unwrap();

        assert_eq!(
            report,
            ScheduleReport {
                published: 5,
                skipped: 0,
                failed: 0
            }
        );
        assert_eq!(client.publish_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_skips_when_disconnected() {
        let client = Arc::new(RecordingClient::new(false));
        let report = spawn_publish_loop(task(client.clone()), settings(3))
            .await
            .unwrap();

        assert_eq!(report.skipped, 3);
        assert_eq!(report.runs(), 3);
        assert_eq!(client.publish_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_schedule() {
        let client = Arc::new(RecordingClient::new(true).failing(io::ErrorKind::BrokenPipe));
        let report = spawn_publish_loop(task(client.clone()), settings(4))
            .await
            .unwrap();

        assert_eq!(report.failed, 4);
        // One attempt per tick, no retries
        assert_eq!(client.publish_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_schedule_can_be_aborted() {
        let client = Arc::new(RecordingClient::new(true));
        let handle = spawn_publish_loop(
            task(client.clone()),
            ScheduleSettings {
                interval: Duration::from_secs(1),
                max_runs: None,
            },
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(client.publish_count(), 3);
    }
}
