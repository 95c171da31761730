//! Periodic maintenance: offer expiry sweep and reconciliation
//!
//! Both run as `TaskKind::Periodic` background tasks. The manager is
//! synchronous, so each pass runs on the blocking pool.

use super::manager::RegistrationManager;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Expires unclaimed equipment offers on a fixed interval
pub struct OfferSweeper {
    manager: RegistrationManager,
    interval: Duration,
    shutdown: CancellationToken,
}

impl OfferSweeper {
    pub fn new(manager: RegistrationManager, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            manager,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Offer sweeper started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Offer sweeper received shutdown signal");
                    return;
                }
            }

            let manager = self.manager.clone();
            match tokio::task::spawn_blocking(move || manager.expire_offers()).await {
                Ok(Ok(expired)) => {
                    if expired > 0 {
                        tracing::debug!(expired, "Offer sweep finished");
                    }
                }
                Ok(Err(e)) => tracing::error!(error = %e, "Offer sweep failed"),
                Err(e) => tracing::error!(error = %e, "Offer sweep task panicked"),
            }
        }
    }
}

/// Reconciles every resource at startup and then on a fixed interval
pub struct ReconcileScheduler {
    manager: RegistrationManager,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ReconcileScheduler {
    pub fn new(manager: RegistrationManager, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            manager,
            interval,
            shutdown,
        }
    }

    /// 主循环：启动补扫 → 周期触发
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Reconcile scheduler started");

        self.pass("startup").await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reconcile scheduler received shutdown signal");
                    return;
                }
            }
            self.pass("periodic").await;
        }
    }

    async fn pass(&self, trigger: &'static str) {
        let manager = self.manager.clone();
        match tokio::task::spawn_blocking(move || manager.reconcile_all()).await {
            Ok(Ok(reports)) => {
                let corrected = reports.iter().filter(|r| r.changed()).count();
                tracing::info!(
                    trigger,
                    resources = reports.len(),
                    corrected,
                    "Reconciliation pass finished"
                );
            }
            Ok(Err(e)) => tracing::error!(trigger, error = %e, "Reconciliation pass failed"),
            Err(e) => tracing::error!(trigger, error = %e, "Reconciliation task panicked"),
        }
    }
}
