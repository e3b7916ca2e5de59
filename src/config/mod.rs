//! # Configuration Management
//!
//! Typed configuration for the depot core, loaded from YAML with an optional
//! per-environment overlay (`depot.yaml` merged under `depot.{env}.yaml`,
//! environment selected by `DEPOT_ENV`). Every struct carries serde defaults
//! so a partial file is valid; `validate` rejects values the engines cannot
//! run with.

use crate::constants::{HOUR, MINUTE};
use crate::error::{DepotError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::debug;

/// Refresh cadence and freshness policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsRefreshPolicyConfig {
    /// Interval of the fleet-wide refresh trigger, and the freshness window a
    /// non-full refresh uses to skip recently refreshed coordinates.
    pub versions_update_interval_in_millis: u64,
}

impl Default for ArtifactsRefreshPolicyConfig {
    fn default() -> Self {
        Self {
            versions_update_interval_in_millis: HOUR,
        }
    }
}

/// Retention policy applied by the purge service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsRetentionPolicyConfig {
    /// Days a fixed release may sit unaccessed before the LRU sweep evicts it.
    pub ttl_for_versions_in_days: i64,
    /// Days a snapshot may sit unaccessed before the LRU sweep evicts it.
    pub ttl_for_snapshots_in_days: i64,
    /// Snapshot count the LRU sweep keeps per project.
    pub maximum_snapshots_allowed: usize,
}

impl Default for ArtifactsRetentionPolicyConfig {
    fn default() -> Self {
        Self {
            ttl_for_versions_in_days: 365,
            ttl_for_snapshots_in_days: 30,
            maximum_snapshots_allowed: 5,
        }
    }
}

/// Scheduler identity and cadence overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Stable node identifier for lease ownership; a random one is generated
    /// when absent.
    pub node_id: Option<String>,
    pub eviction_initial_delay_in_millis: u64,
    pub eviction_interval_in_millis: u64,
    pub deprecation_initial_delay_in_millis: u64,
    pub deprecation_interval_in_millis: u64,
    pub reconciliation_interval_in_millis: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            eviction_initial_delay_in_millis: MINUTE,
            eviction_interval_in_millis: 24 * HOUR,
            deprecation_initial_delay_in_millis: MINUTE,
            deprecation_interval_in_millis: 48 * HOUR,
            reconciliation_interval_in_millis: 5 * MINUTE,
        }
    }
}

/// Connection settings for the shared store backing the schedule leases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/depot".to_string(),
            pool: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    pub refresh: ArtifactsRefreshPolicyConfig,
    pub retention: ArtifactsRetentionPolicyConfig,
    pub scheduler: SchedulerConfig,
    pub database: DatabaseConfig,
}

impl SchedulerConfig {
    /// The configured node id, or a generated one. Callers resolve this once
    /// when constructing the scheduler; a generated id is fresh per call.
    pub fn node_identity(&self) -> String {
        self.node_id
            .clone()
            .unwrap_or_else(|| format!("depot-{}", uuid::Uuid::new_v4()))
    }
}

impl DepotConfig {
    /// Load `depot.yaml` from a directory, overlaying `depot.{env}.yaml` when
    /// present. Environment comes from `DEPOT_ENV`, default `development`.
    pub fn load_from_directory(config_dir: &Path) -> Result<Self> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    pub fn load_from_directory_with_env(config_dir: &Path, environment: &str) -> Result<Self> {
        debug!(
            environment,
            directory = %config_dir.display(),
            "Loading depot configuration"
        );

        let base = Self::read_yaml(&config_dir.join("depot.yaml"))?;
        let overlay_path = config_dir.join(format!("depot.{environment}.yaml"));
        let merged = if overlay_path.exists() {
            let overlay = Self::read_yaml(&overlay_path)?;
            Self::merge(base, overlay)
        } else {
            base
        };

        let config: DepotConfig = serde_yaml::from_value(merged)
            .map_err(|e| DepotError::ConfigurationError(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn detect_environment() -> String {
        env::var("DEPOT_ENV").unwrap_or_else(|_| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh.versions_update_interval_in_millis == 0 {
            return Err(DepotError::ConfigurationError(
                "versions_update_interval_in_millis must be positive".to_string(),
            ));
        }
        if self.retention.ttl_for_versions_in_days <= 0
            || self.retention.ttl_for_snapshots_in_days <= 0
        {
            return Err(DepotError::ConfigurationError(
                "retention TTLs must be positive".to_string(),
            ));
        }
        if self.database.pool == 0 {
            return Err(DepotError::ConfigurationError(
                "database pool size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn read_yaml(path: &Path) -> Result<serde_yaml::Value> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DepotError::ConfigurationError(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            DepotError::ConfigurationError(format!("cannot parse {}: {e}", path.display()))
        })
    }

    /// Overlay mappings recursively; scalar and sequence values from the
    /// overlay win.
    fn merge(base: serde_yaml::Value, overlay: serde_yaml::Value) -> serde_yaml::Value {
        use serde_yaml::Value;
        match (base, overlay) {
            (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
                for (key, overlay_value) in overlay_map {
                    let merged = match base_map.remove(&key) {
                        Some(base_value) => Self::merge(base_value, overlay_value),
                        None => overlay_value,
                    };
                    base_map.insert(key, merged);
                }
                Value::Mapping(base_map)
            }
            (_, overlay) => overlay,
        }
    }
}
