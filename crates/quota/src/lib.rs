//! Per-user, per-agent daily usage accounting
//!
//! Tracks accumulated pipeline seconds per `(user, agent)` key against an
//! agent-specific daily ceiling. The day boundary is UTC midnight; usage
//! resets exactly once when an operation first observes the new day.
//!
//! The in-memory store keeps each read-day/maybe-reset/mutate sequence
//! inside a single map-entry critical section, so concurrent requests for
//! the same user never lose an update, while requests across different
//! users proceed fully in parallel.

pub mod store;

pub use store::{InMemoryQuotaStore, QuotaCeilings};
