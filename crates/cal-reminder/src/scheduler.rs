//! Reminder scheduler
//!
//! Runs scan cycles on a fixed interval until shutdown.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use crate::scan::{ScanContext, run_cycle};
use cal_core::config::ReminderConfig;

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the in-flight cycle to finish
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// Background reminder scheduler.
///
/// `start` consumes the scheduler and returns the only handle to it, so a
/// second start of the same instance is unrepresentable. Whether to run one
/// at all is a boot-time decision (`ReminderConfig::enabled`).
pub struct ReminderScheduler {
    config: ReminderConfig,
    ctx: ScanContext,
}

impl ReminderScheduler {
    /// Create a new scheduler over the given stores and mailer
    pub fn new(config: ReminderConfig, ctx: ScanContext) -> Self {
        Self { config, ctx }
    }

    /// Start the scan loop: one cycle immediately, then one per interval
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move {
            info!(
                interval_secs = self.config.interval_secs,
                leeway_secs = self.config.leeway_secs,
                "reminder scheduler started"
            );

            let interval = Duration::from_secs(self.config.interval_secs.max(1));

            loop {
                // Cycle errors are handled inside; the timer always survives
                run_cycle(&self.ctx, &self.config, Utc::now()).await;

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.recv() => {
                        info!("reminder scheduler stopped");
                        break;
                    }
                }
            }
        });

        SchedulerHandle {
            shutdown_tx,
            handle,
        }
    }
}
