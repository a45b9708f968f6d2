//! Membership sweep. Periodically drops members whose presence lapsed.
//!
//! Readers already prune what they touch. The sweep covers manifests
//! nobody is reading. A manifest that keeps failing is skipped for the
//! cycle and picked up again on the next one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::error::ServiceError;
use crate::registry::Registry;

const RETRY_BACKOFF: Duration = Duration::from_millis(200);
const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Manifests visited.
    pub manifests: usize,
    /// Stale members removed.
    pub pruned: usize,
    /// Manifests skipped after exhausting their attempts.
    pub failed: usize,
}

pub struct Sweeper {
    registry: Arc<Registry>,
    interval: Duration,
    max_attempts: u32,
}

impl Sweeper {
    pub fn new(registry: Arc<Registry>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            registry,
            interval: interval.max(MIN_INTERVAL),
            max_attempts: max_attempts.max(1),
        }
    }

    /// One pass over every manifest.
    ///
    /// Fails only if the manifest list itself cannot be read.
    pub async fn sweep_once(&self) -> Result<SweepReport, ServiceError> {
        let manifests = self.registry.manifests().await?;
        let mut report = SweepReport {
            manifests: manifests.len(),
            ..Default::default()
        };

        for manifest in &manifests {
            match self.prune_with_retry(manifest).await {
                Ok(n) => report.pruned += n,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(manifest = %manifest, error = %e, "sweep skipped manifest");
                }
            }
        }
        Ok(report)
    }

    async fn prune_with_retry(&self, manifest: &str) -> Result<usize, ServiceError> {
        let mut attempt = 1;
        loop {
            match self.registry.prune(manifest).await {
                Ok(n) => return Ok(n),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    tracing::debug!(manifest = %manifest, attempt, error = %e, "prune failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sweep on a fixed interval until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "membership sweep starting");

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.recv() => {
                    tracing::info!("membership sweep stopping");
                    return;
                }
            }

            match self.sweep_once().await {
                Ok(report) if report.pruned > 0 || report.failed > 0 => {
                    tracing::info!(
                        manifests = report.manifests,
                        pruned = report.pruned,
                        failed = report.failed,
                        "membership sweep"
                    );
                }
                Ok(report) => {
                    tracing::debug!(manifests = report.manifests, "membership sweep, nothing stale");
                }
                Err(e) => tracing::warn!(error = %e, "membership sweep could not list manifests"),
            }
        }
    }
}
