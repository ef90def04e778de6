use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Percentage weights applied to each sub-score. Valid only when they sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub completion: u8,
    pub timeliness: u8,
    pub quality: u8,
    pub kra_alignment: u8,
}

impl ScoringWeights {
    pub const REQUIRED_TOTAL: u32 = 100;

    pub const DEFAULT: Self = Self {
        completion: 40,
        timeliness: 30,
        quality: 20,
        kra_alignment: 10,
    };

    pub fn total(&self) -> u32 {
        u32::from(self.completion)
            + u32::from(self.timeliness)
            + u32::from(self.quality)
            + u32::from(self.kra_alignment)
    }

    pub fn validate(&self) -> Result<(), ConfigStoreError> {
        let got = self.total();
        if got == Self::REQUIRED_TOTAL {
            Ok(())
        } else {
            Err(ConfigStoreError::InvalidConfig { got })
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The active scoring configuration with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl ScoringConfig {
    pub fn defaults(initialized_by: impl Into<String>) -> Self {
        Self {
            weights: ScoringWeights::DEFAULT,
            updated_by: initialized_by.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Candidate configuration submitted through `set_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfigUpdate {
    pub weights: ScoringWeights,
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("scoring weights must sum to 100 (got {got})")]
    InvalidConfig { got: u32 },
    #[error("no scoring configuration has been initialized")]
    NotFound,
}

/// Holds the single current scoring configuration.
///
/// Readers clone an `Arc` snapshot, so they observe either the previous or the
/// next configuration, never a mix. Writers validate and swap under the write
/// lock, which serializes concurrent updates.
#[derive(Debug, Default)]
pub struct ScoringConfigStore {
    current: RwLock<Option<Arc<ScoringConfig>>>,
}

impl ScoringConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Result<Self, ConfigStoreError> {
        config.weights.validate()?;
        Ok(Self {
            current: RwLock::new(Some(Arc::new(config))),
        })
    }

    pub fn get_active_config(&self) -> Result<ScoringConfig, ConfigStoreError> {
        self.read_snapshot()
            .map(|config| (*config).clone())
            .ok_or(ConfigStoreError::NotFound)
    }

    pub fn set_config(
        &self,
        candidate: ScoringConfigUpdate,
    ) -> Result<ScoringConfig, ConfigStoreError> {
        let mut guard = self.current.write().expect("scoring config lock poisoned");
        if let Err(err) = candidate.weights.validate() {
            warn!(
                updated_by = %candidate.updated_by,
                total = candidate.weights.total(),
                "rejected scoring configuration"
            );
            return Err(err);
        }

        let config = ScoringConfig {
            weights: candidate.weights,
            updated_by: candidate.updated_by,
            updated_at: Utc::now(),
        };
        *guard = Some(Arc::new(config.clone()));
        info!(
            updated_by = %config.updated_by,
            weights = ?config.weights,
            "scoring configuration updated"
        );
        Ok(config)
    }

    /// Returns the existing configuration unchanged, or installs the defaults.
    pub fn initialize_defaults(&self, initialized_by: &str) -> ScoringConfig {
        let mut guard = self.current.write().expect("scoring config lock poisoned");
        if let Some(existing) = guard.as_ref() {
            return (**existing).clone();
        }

        let config = ScoringConfig::defaults(initialized_by);
        *guard = Some(Arc::new(config.clone()));
        info!(initialized_by, "scoring configuration initialized with defaults");
        config
    }

    /// Single consistent read for one report run; falls back to the defaults without storing them.
    pub fn snapshot_or_default(&self) -> ScoringConfig {
        match self.read_snapshot() {
            Some(config) => (*config).clone(),
            None => {
                warn!("no scoring configuration initialized; scoring with defaults");
                ScoringConfig::defaults("system")
            }
        }
    }

    fn read_snapshot(&self) -> Option<Arc<ScoringConfig>> {
        self.current
            .read()
            .expect("scoring config lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn update(weights: (u8, u8, u8, u8), by: &str) -> ScoringConfigUpdate {
        ScoringConfigUpdate {
            weights: ScoringWeights {
                completion: weights.0,
                timeliness: weights.1,
                quality: weights.2,
                kra_alignment: weights.3,
            },
            updated_by: by.to_string(),
        }
    }

    #[test]
    fn active_config_is_missing_until_initialized() {
        let store = ScoringConfigStore::new();
        assert_eq!(store.get_active_config(), Err(ConfigStoreError::NotFound));

        let config = store.initialize_defaults("admin");
        assert_eq!(config.weights, ScoringWeights::DEFAULT);
        assert_eq!(store.get_active_config().expect("config").updated_by, "admin");
    }

    #[test]
    fn initialize_defaults_does_not_reset_tuned_config() {
        let store = ScoringConfigStore::new();
        store.initialize_defaults("admin");
        store
            .set_config(update((25, 25, 25, 25), "lead"))
            .expect("valid weights");

        let config = store.initialize_defaults("someone-else");
        assert_eq!(config.weights.completion, 25);
        assert_eq!(config.updated_by, "lead");
    }

    #[test]
    fn invalid_weights_are_rejected_without_state_change() {
        let store = ScoringConfigStore::new();
        let before = store.initialize_defaults("admin");

        let error = store
            .set_config(update((50, 30, 20, 10), "lead"))
            .expect_err("sum of 110 rejected");
        assert_eq!(error, ConfigStoreError::InvalidConfig { got: 110 });
        assert_eq!(store.get_active_config().expect("config"), before);

        let error = store
            .set_config(update((0, 0, 0, 0), "lead"))
            .expect_err("sum of 0 rejected");
        assert_eq!(error, ConfigStoreError::InvalidConfig { got: 0 });
    }

    #[test]
    fn invalid_weights_are_rejected_on_empty_store() {
        let store = ScoringConfigStore::new();
        assert!(store.set_config(update((99, 0, 0, 0), "lead")).is_err());
        assert_eq!(store.get_active_config(), Err(ConfigStoreError::NotFound));
    }

    #[test]
    fn with_config_enforces_invariant() {
        let mut config = ScoringConfig::defaults("seed");
        config.weights.quality = 0;
        assert_eq!(
            ScoringConfigStore::with_config(config).err(),
            Some(ConfigStoreError::InvalidConfig { got: 80 })
        );
    }

    #[test]
    fn snapshot_falls_back_to_defaults_without_storing() {
        let store = ScoringConfigStore::new();
        assert_eq!(store.snapshot_or_default().weights, ScoringWeights::DEFAULT);
        assert!(store.get_active_config().is_err());
    }

    #[test]
    fn concurrent_writers_leave_a_valid_config() {
        let store = Arc::new(ScoringConfigStore::new());
        store.initialize_defaults("admin");

        let handles: Vec<_> = (0..16u8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    let weights = if i % 2 == 0 {
                        (70, 10, 10, 10)
                    } else {
                        (10, 10, 10, 70)
                    };
                    let _ = store.set_config(update(weights, &format!("writer-{i}")));
                    let _ = store.set_config(update((60, 60, 0, 0), "bad-writer"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let config = store.get_active_config().expect("config");
        assert_eq!(config.weights.total(), 100);
        assert_ne!(config.updated_by, "bad-writer");
    }
}
