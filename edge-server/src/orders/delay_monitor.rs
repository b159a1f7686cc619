//! 出餐延迟监控
//!
//! Periodically scans items in `preparing` and raises `delayAlert` to the
//! kitchen and waiters once per item per severity level.
//!
//! Registered as `TaskKind::Periodic` in `Server::run`.

use super::coordinator::{CoordinatorResult, LifecycleCoordinator};
use crate::realtime::EventSink;
use shared::message::{DelaySeverity, EventPayload};
use shared::models::ItemStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Preparation age thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayThresholds {
    pub warning: Duration,
    pub critical: Duration,
}

impl DelayThresholds {
    pub fn classify(&self, age: Duration) -> Option<DelaySeverity> {
        if age >= self.critical {
            Some(DelaySeverity::Critical)
        } else if age >= self.warning {
            Some(DelaySeverity::Warning)
        } else {
            None
        }
    }
}

pub struct DelayMonitor {
    coordinator: Arc<LifecycleCoordinator>,
    events: Arc<dyn EventSink>,
    thresholds: DelayThresholds,
    interval: Duration,
    shutdown: CancellationToken,
    /// Highest severity already announced per item
    alerted: HashMap<i64, DelaySeverity>,
}

impl DelayMonitor {
    pub fn new(
        coordinator: Arc<LifecycleCoordinator>,
        events: Arc<dyn EventSink>,
        thresholds: DelayThresholds,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            coordinator,
            events,
            thresholds,
            interval,
            shutdown,
            alerted: HashMap::new(),
        }
    }

    /// 主循环
    pub async fn run(mut self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            warning_mins = self.thresholds.warning.as_secs() / 60,
            critical_mins = self.thresholds.critical.as_secs() / 60,
            "Delay monitor started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.scan(shared::util::now_millis()).await {
                        tracing::error!(error = %e, "Delay scan failed");
                    }
                }
            }
        }
        tracing::info!("Delay monitor stopped");
    }

    /// One pass over the preparing items; returns the number of alerts raised
    pub async fn scan(&mut self, now: i64) -> CoordinatorResult<usize> {
        let preparing: Vec<_> = self
            .coordinator
            .list_kitchen_items()
            .await?
            .into_iter()
            .filter(|line| line.item.status == ItemStatus::Preparing)
            .collect();

        // forget items that left `preparing`
        self.alerted
            .retain(|id, _| preparing.iter().any(|line| line.item.id == *id));

        let mut raised = 0;
        for line in preparing {
            let Some(started) = line.item.preparation_start_time else {
                continue;
            };
            let age = Duration::from_millis(now.saturating_sub(started).max(0) as u64);
            let Some(severity) = self.thresholds.classify(age) else {
                continue;
            };
            if self
                .alerted
                .get(&line.item.id)
                .is_some_and(|seen| *seen >= severity)
            {
                continue;
            }
            self.alerted.insert(line.item.id, severity);
            tracing::warn!(
                item_id = line.item.id,
                table = %line.table_number,
                product = %line.item.product_name,
                age_mins = age.as_secs() / 60,
                ?severity,
                "Preparation delayed"
            );
            self.events.publish(EventPayload::DelayAlert {
                item_id: line.item.id,
                table_number: line.table_number,
                product_name: line.item.product_name,
                severity,
            });
            raised += 1;
        }
        Ok(raised)
    }
}
