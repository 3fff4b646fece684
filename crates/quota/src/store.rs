//! In-memory quota store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use voice_gateway_core::{Admission, QuotaError, QuotaStore};

/// Per-agent daily ceilings, in seconds
#[derive(Debug, Clone)]
pub struct QuotaCeilings {
    per_agent: HashMap<String, f64>,
    default_seconds: f64,
}

impl QuotaCeilings {
    pub fn new(per_agent: HashMap<String, f64>, default_seconds: f64) -> Self {
        Self {
            per_agent,
            default_seconds,
        }
    }

    /// Ceiling for an agent; unknown agents get the default
    pub fn for_agent(&self, agent_id: &str) -> f64 {
        self.per_agent
            .get(agent_id)
            .copied()
            .unwrap_or(self.default_seconds)
    }
}

/// Accumulated usage for one (user, agent) key
#[derive(Debug, Clone, Copy)]
struct QuotaRecord {
    used_seconds: f64,
    day: NaiveDate,
}

impl QuotaRecord {
    fn fresh(day: NaiveDate) -> Self {
        Self {
            used_seconds: 0.0,
            day,
        }
    }

    /// Reset usage when the stored day is no longer `today`.
    ///
    /// Rewrites `day`, so a second call on the same day is a no-op.
    fn roll_over(&mut self, today: NaiveDate) {
        if self.day != today {
            self.used_seconds = 0.0;
            self.day = today;
        }
    }
}

/// In-memory `QuotaStore` implementation
///
/// Records are created lazily on first access and evicted by a background
/// sweep once their day falls further in the past than the configured TTL.
/// All mutation goes through `DashMap::entry`, which serializes the
/// read/reset/mutate sequence per key without ever holding a lock across a
/// stage call.
pub struct InMemoryQuotaStore {
    records: DashMap<(String, String), QuotaRecord>,
    ceilings: QuotaCeilings,
}

impl InMemoryQuotaStore {
    pub fn new(ceilings: QuotaCeilings) -> Self {
        Self {
            records: DashMap::new(),
            ceilings,
        }
    }

    /// Number of live records (for diagnostics)
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn admission_at(
        &self,
        user_id: &str,
        agent_id: &str,
        estimated_seconds: f64,
        today: NaiveDate,
    ) -> Admission {
        let limit_seconds = self.ceilings.for_agent(agent_id);
        let mut record = self
            .records
            .entry((user_id.to_string(), agent_id.to_string()))
            .or_insert_with(|| QuotaRecord::fresh(today));
        record.roll_over(today);

        let remaining_seconds = (limit_seconds - record.used_seconds).max(0.0);
        Admission {
            allowed: remaining_seconds >= estimated_seconds,
            remaining_seconds,
            limit_seconds,
        }
    }

    fn settle_at(
        &self,
        user_id: &str,
        agent_id: &str,
        actual_seconds: f64,
        today: NaiveDate,
    ) -> f64 {
        let limit_seconds = self.ceilings.for_agent(agent_id);
        let mut record = self
            .records
            .entry((user_id.to_string(), agent_id.to_string()))
            .or_insert_with(|| QuotaRecord::fresh(today));
        record.roll_over(today);
        record.used_seconds += actual_seconds;

        tracing::debug!(
            user_id,
            agent_id,
            charged = actual_seconds,
            used = record.used_seconds,
            limit = limit_seconds,
            "settled quota"
        );

        (limit_seconds - record.used_seconds).max(0.0)
    }

    /// Drop records whose day is older than `ttl_days` before `today`.
    ///
    /// Returns the number of evicted records.
    pub fn evict_stale(&self, today: NaiveDate, ttl_days: i64) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| (today - record.day).num_days() <= ttl_days);
        before - self.records.len()
    }

    /// Start a background task that periodically evicts stale records.
    ///
    /// Returns a shutdown sender; send `true` to stop the task.
    pub fn spawn_eviction_task(
        self: &Arc<Self>,
        interval: Duration,
        ttl_days: i64,
    ) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = store.evict_stale(Utc::now().date_naive(), ttl_days);
                        if evicted > 0 {
                            tracing::info!(
                                evicted,
                                remaining = store.record_count(),
                                "evicted stale quota records"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("quota eviction task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn check_admission(
        &self,
        user_id: &str,
        agent_id: &str,
        estimated_seconds: f64,
    ) -> Result<Admission, QuotaError> {
        Ok(self.admission_at(user_id, agent_id, estimated_seconds, Utc::now().date_naive()))
    }

    async fn settle(
        &self,
        user_id: &str,
        agent_id: &str,
        actual_seconds: f64,
    ) -> Result<f64, QuotaError> {
        Ok(self.settle_at(user_id, agent_id, actual_seconds, Utc::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ceilings() -> QuotaCeilings {
        let mut per_agent = HashMap::new();
        per_agent.insert("general".to_string(), 600.0);
        per_agent.insert("specialist".to_string(), 900.0);
        QuotaCeilings::new(per_agent, 600.0)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_agent_specific_ceiling() {
        let store = InMemoryQuotaStore::new(ceilings());
        let today = day(2026, 8, 6);

        let admission = store.admission_at("u", "specialist", 901.0, today);
        assert!(!admission.allowed);
        assert_eq!(admission.limit_seconds, 900.0);

        let admission = store.admission_at("u", "specialist", 899.0, today);
        assert!(admission.allowed);
        assert_eq!(admission.remaining_seconds, 900.0);
    }

    #[test]
    fn test_unknown_agent_uses_default_ceiling() {
        let store = InMemoryQuotaStore::new(ceilings());
        let admission = store.admission_at("u", "mystery", 0.0, day(2026, 8, 6));
        assert_eq!(admission.limit_seconds, 600.0);
    }

    #[test]
    fn test_status_probe_never_consumes() {
        let store = InMemoryQuotaStore::new(ceilings());
        let today = day(2026, 8, 6);

        for _ in 0..10 {
            let admission = store.admission_at("u", "general", 0.0, today);
            assert!(admission.allowed);
            assert_eq!(admission.remaining_seconds, 600.0);
        }

        store.settle_at("u", "general", 10.0, today);
        let admission = store.admission_at("u", "general", 0.0, today);
        assert_eq!(admission.remaining_seconds, 590.0);
    }

    #[test]
    fn test_day_rollover_resets_once() {
        let store = InMemoryQuotaStore::new(ceilings());
        let monday = day(2026, 8, 3);
        let tuesday = day(2026, 8, 4);

        store.settle_at("u", "general", 500.0, monday);
        assert_eq!(
            store.admission_at("u", "general", 0.0, monday).remaining_seconds,
            100.0
        );

        // first operation on the new day observes a full budget
        let admission = store.admission_at("u", "general", 0.0, tuesday);
        assert_eq!(admission.remaining_seconds, 600.0);

        // reset is idempotent: usage accrued after the rollover survives
        store.settle_at("u", "general", 5.0, tuesday);
        let admission = store.admission_at("u", "general", 0.0, tuesday);
        assert_eq!(admission.remaining_seconds, 595.0);
    }

    #[test]
    fn test_settle_applies_rollover_first() {
        let store = InMemoryQuotaStore::new(ceilings());
        store.settle_at("u", "general", 500.0, day(2026, 8, 3));

        // settling on the new day discards yesterday's usage before adding
        let remaining = store.settle_at("u", "general", 20.0, day(2026, 8, 4));
        assert_eq!(remaining, 580.0);
    }

    #[test]
    fn test_rejection_reports_remaining() {
        let store = InMemoryQuotaStore::new(ceilings());
        let today = day(2026, 8, 6);

        store.settle_at("u", "general", 597.0, today);
        let admission = store.admission_at("u", "general", 5.0, today);
        assert!(!admission.allowed);
        assert_eq!(admission.remaining_seconds, 3.0);
    }

    #[test]
    fn test_eviction_drops_only_stale_records() {
        let store = InMemoryQuotaStore::new(ceilings());
        let today = day(2026, 8, 6);

        store.settle_at("old", "general", 1.0, day(2026, 7, 1));
        store.settle_at("new", "general", 1.0, today);
        assert_eq!(store.record_count(), 2);

        let evicted = store.evict_stale(today, 7);
        assert_eq!(evicted, 1);
        assert_eq!(store.record_count(), 1);
        assert_eq!(
            store.admission_at("new", "general", 0.0, today).remaining_seconds,
            599.0
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_settles_lose_no_updates() {
        let store = Arc::new(InMemoryQuotaStore::new(ceilings()));
        let today = day(2026, 8, 6);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.settle_at("u", "general", 1.0, today);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let admission = store.admission_at("u", "general", 0.0, today);
        assert_eq!(admission.remaining_seconds, 600.0 - 32.0);
    }

    #[tokio::test]
    async fn test_trait_surface() {
        let store = InMemoryQuotaStore::new(ceilings());
        let admission = store.check_admission("u", "general", 5.0).await.unwrap();
        assert!(admission.allowed);

        let remaining = store.settle("u", "general", 2.5).await.unwrap();
        assert_eq!(remaining, 597.5);
    }
}
