//! Server-side deadline watch
//!
//! Client countdowns normally close expired pairings. The sweeper closes the
//! ones nobody closed once the grace period has also passed, and purges
//! waiting entries whose clients vanished without cancelling.

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use vibe_core::PairingStatus;

use super::consent::ConsentTracker;
use super::context::MatchContext;
use super::error::ServiceResult;
use super::pool::PoolManager;

/// Pairings expired per sweep
const SWEEP_BATCH: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired: usize,
    pub purged: usize,
}

pub struct DeadlineSweeper {
    ctx: MatchContext,
}

impl DeadlineSweeper {
    pub fn new(ctx: MatchContext) -> Self {
        Self { ctx }
    }

    /// One pass: expire overdue pairings, then purge stale pool entries
    pub async fn sweep_once(&self) -> ServiceResult<SweepReport> {
        let cutoff = self.ctx.now() - self.ctx.settings().expiry_grace();
        let overdue = self
            .ctx
            .pairing_store()
            .find_expired(cutoff, SWEEP_BATCH)
            .await?;

        let tracker = ConsentTracker::new(&self.ctx);
        let mut report = SweepReport::default();

        for pairing in overdue {
            match tracker.expire(pairing.id, None).await {
                Ok(result) if result.pairing.status == PairingStatus::Abandoned => {
                    report.expired += 1;
                }
                Ok(_) => {}
                Err(e) => warn!(pairing_id = %pairing.id, error = %e, "Failed to expire pairing"),
            }
        }

        report.purged = PoolManager::new(&self.ctx).purge_stale().await?.len();

        if report != SweepReport::default() {
            info!(expired = report.expired, purged = report.purged, "Sweep finished");
        }
        Ok(report)
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.ctx.settings().sweep_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                every_secs = self.ctx.settings().sweep_interval_secs,
                "Deadline sweeper started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            warn!(error = %e, retryable = e.is_retryable(), "Sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("Deadline sweeper stopped");
        })
    }
}
