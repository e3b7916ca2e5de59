//! # Schedule Leases
//!
//! Cluster-wide single-instance scheduling rests on lease-based mutual
//! exclusion, not consensus: a lease row in the shared store, claimed with an
//! atomic "insert if absent or expired" conditional write. Every node's timer
//! fires; only the node holding the lease runs the job for that tick, losers
//! skip silently. The lease carries a TTL so another node can take over if a
//! holder dies mid-job, and long jobs renew it while they run.

use crate::error::{DepotError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, error};

/// Lease claim/release/renew operations against the shared store.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Claim the named lease for `holder` until now + `ttl`. Returns `false`
    /// when another holder's unexpired lease exists; claiming never blocks
    /// waiting for one.
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool>;

    /// Extend a held lease. Returns `false` when the lease is no longer held
    /// by `holder` (expired and taken over).
    async fn renew(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool>;

    /// Best-effort release; a failed release just leaves the lease to expire.
    async fn release(&self, name: &str, holder: &str) -> Result<()>;
}

/// Postgres-backed lease store.
///
/// Expects the table:
///
/// ```sql
/// CREATE TABLE schedule_leases (
///     name       VARCHAR PRIMARY KEY,
///     holder     VARCHAR NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```
pub struct PgLeaseStore {
    pool: PgPool,
}

impl PgLeaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaseStore for PgLeaseStore {
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let expires_at = Utc::now() + ttl;

        // The WHERE clause makes the upsert conditional: an unexpired lease
        // held by someone else leaves the row untouched and returns no rows.
        let query = r#"
            INSERT INTO schedule_leases (name, holder, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET holder = EXCLUDED.holder, expires_at = EXCLUDED.expires_at
            WHERE schedule_leases.expires_at < NOW()
               OR schedule_leases.holder = EXCLUDED.holder
            RETURNING holder
        "#;

        let row: Option<(String,)> = sqlx::query_as(query)
            .bind(name)
            .bind(holder)
            .bind(expires_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(lease = name, "Failed to claim schedule lease: {}", e);
                DepotError::StoreError(format!("lease claim failed for '{name}': {e}"))
            })?;

        let acquired = row.is_some();
        debug!(lease = name, holder = holder, acquired, "Schedule lease claim attempt");
        Ok(acquired)
    }

    async fn renew(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let expires_at = Utc::now() + ttl;

        let query = r#"
            UPDATE schedule_leases
            SET expires_at = $3
            WHERE name = $1 AND holder = $2
            RETURNING holder
        "#;

        let row: Option<(String,)> = sqlx::query_as(query)
            .bind(name)
            .bind(holder)
            .bind(expires_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(lease = name, "Failed to renew schedule lease: {}", e);
                DepotError::StoreError(format!("lease renewal failed for '{name}': {e}"))
            })?;

        Ok(row.is_some())
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        sqlx::query("DELETE FROM schedule_leases WHERE name = $1 AND holder = $2")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(lease = name, "Failed to release schedule lease: {}", e);
                DepotError::StoreError(format!("lease release failed for '{name}': {e}"))
            })?;
        Ok(())
    }
}

#[derive(Clone)]
struct LeaseRow {
    holder: String,
    expires_at: DateTime<Utc>,
}

/// In-memory lease store with the same claim semantics, shared across
/// simulated nodes in tests and used by embedded single-node deployments.
#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: Mutex<HashMap<String, LeaseRow>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let now = Utc::now();
        let mut leases = self.leases.lock();
        match leases.get(name) {
            Some(row) if row.expires_at > now && row.holder != holder => Ok(false),
            _ => {
                leases.insert(
                    name.to_string(),
                    LeaseRow {
                        holder: holder.to_string(),
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn renew(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let now = Utc::now();
        let mut leases = self.leases.lock();
        match leases.get_mut(name) {
            Some(row) if row.holder == holder => {
                row.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        let mut leases = self.leases.lock();
        if leases.get(name).is_some_and(|row| row.holder == holder) {
            leases.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_is_exclusive_until_released() {
        let store = InMemoryLeaseStore::new();
        let ttl = Duration::minutes(5);

        assert!(store.try_acquire("sweep", "node-a", ttl).await.unwrap());
        assert!(!store.try_acquire("sweep", "node-b", ttl).await.unwrap());
        // Re-claim by the holder extends rather than conflicts.
        assert!(store.try_acquire("sweep", "node-a", ttl).await.unwrap());

        store.release("sweep", "node-a").await.unwrap();
        assert!(store.try_acquire("sweep", "node-b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_lease_can_be_taken_over() {
        let store = InMemoryLeaseStore::new();
        assert!(store
            .try_acquire("sweep", "node-a", Duration::milliseconds(-1))
            .await
            .unwrap());
        assert!(store
            .try_acquire("sweep", "node-b", Duration::minutes(5))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_renew_requires_ownership() {
        let store = InMemoryLeaseStore::new();
        let ttl = Duration::minutes(5);
        assert!(store.try_acquire("sweep", "node-a", ttl).await.unwrap());
        assert!(store.renew("sweep", "node-a", ttl).await.unwrap());
        assert!(!store.renew("sweep", "node-b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_by_non_holder_is_ignored() {
        let store = InMemoryLeaseStore::new();
        let ttl = Duration::minutes(5);
        assert!(store.try_acquire("sweep", "node-a", ttl).await.unwrap());
        store.release("sweep", "node-b").await.unwrap();
        assert!(!store.try_acquire("sweep", "node-b", ttl).await.unwrap());
    }
}
