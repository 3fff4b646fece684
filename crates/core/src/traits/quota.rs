//! Quota store trait

use async_trait::async_trait;

use crate::error::QuotaError;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy)]
pub struct Admission {
    /// Whether the estimated cost fits the remaining budget
    pub allowed: bool,
    /// Seconds still available for this (user, agent) today
    pub remaining_seconds: f64,
    /// Daily ceiling for this agent, in seconds
    pub limit_seconds: f64,
}

/// Daily usage accounting per (user, agent)
///
/// Implementations own all record mutation; nothing else reads or writes
/// usage directly. The read-day/maybe-reset/mutate sequence for one key
/// must be a single atomic unit, and no lock may be held across a stage
/// call. The day rollover is applied as a side effect of every operation.
#[async_trait]
pub trait QuotaStore: Send + Sync + 'static {
    /// Check whether `estimated_seconds` fits today's remaining budget.
    ///
    /// `estimated_seconds = 0.0` is a pure status probe: it applies the
    /// day rollover but never consumes quota.
    async fn check_admission(
        &self,
        user_id: &str,
        agent_id: &str,
        estimated_seconds: f64,
    ) -> Result<Admission, QuotaError>;

    /// Charge `actual_seconds` of usage and return the remaining budget.
    async fn settle(
        &self,
        user_id: &str,
        agent_id: &str,
        actual_seconds: f64,
    ) -> Result<f64, QuotaError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Minimal reference implementation, enough to exercise the contract
    struct SimpleStore {
        limit: f64,
        used: Mutex<HashMap<(String, String), f64>>,
    }

    #[async_trait]
    impl QuotaStore for SimpleStore {
        async fn check_admission(
            &self,
            user_id: &str,
            agent_id: &str,
            estimated_seconds: f64,
        ) -> Result<Admission, QuotaError> {
            let used = self.used.lock().unwrap();
            let spent = used
                .get(&(user_id.to_string(), agent_id.to_string()))
                .copied()
                .unwrap_or(0.0);
            let remaining = (self.limit - spent).max(0.0);
            Ok(Admission {
                allowed: remaining >= estimated_seconds,
                remaining_seconds: remaining,
                limit_seconds: self.limit,
            })
        }

        async fn settle(
            &self,
            user_id: &str,
            agent_id: &str,
            actual_seconds: f64,
        ) -> Result<f64, QuotaError> {
            let mut used = self.used.lock().unwrap();
            let spent = used
                .entry((user_id.to_string(), agent_id.to_string()))
                .or_insert(0.0);
            *spent += actual_seconds;
            Ok((self.limit - *spent).max(0.0))
        }
    }

    #[tokio::test]
    async fn test_admission_then_settle() {
        let store = SimpleStore {
            limit: 10.0,
            used: Default::default(),
        };

        let admission = store.check_admission("u", "a", 5.0).await.unwrap();
        assert!(admission.allowed);
        assert_eq!(admission.remaining_seconds, 10.0);

        let remaining = store.settle("u", "a", 8.0).await.unwrap();
        assert_eq!(remaining, 2.0);

        let admission = store.check_admission("u", "a", 5.0).await.unwrap();
        assert!(!admission.allowed);
    }
}
