//! Queue configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (via `from_env()`)
//! 3. Library defaults (`defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use labelq_runtime::config::QueueConfig;
//!
//! let config = QueueConfig::from_env()
//!     .max_groups(256)
//!     .promotion_credit(3);
//! config.validate()?;
//! ```

pub mod defaults;

use labelq_core::env::{env_get, env_get_bool};

/// Queue and scheduler context configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of live scheduling groups
    pub max_groups: usize,
    /// Starvation credit added per active-group promotion
    pub promotion_credit: i32,
    /// Initial capacity of the unlabeled FIFO
    pub unlabeled_capacity: usize,
    /// Initial capacity of each per-group FIFO
    pub group_queue_capacity: usize,
    /// Verify queue invariants after every mutation
    pub check_invariants: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl QueueConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `LQ_MAX_GROUPS` - Maximum live groups
    /// - `LQ_PROMOTION_CREDIT` - Credit per active-group promotion
    /// - `LQ_UNLABELED_CAPACITY` - Unlabeled FIFO initial capacity
    /// - `LQ_GROUP_QUEUE_CAPACITY` - Per-group FIFO initial capacity
    /// - `LQ_CHECK_INVARIANTS` - Verify invariants after mutations (0/1)
    pub fn from_env() -> Self {
        Self {
            max_groups: env_get("LQ_MAX_GROUPS", defaults::MAX_GROUPS),
            promotion_credit: env_get("LQ_PROMOTION_CREDIT", defaults::PROMOTION_CREDIT),
            unlabeled_capacity: env_get("LQ_UNLABELED_CAPACITY", defaults::UNLABELED_CAPACITY),
            group_queue_capacity: env_get(
                "LQ_GROUP_QUEUE_CAPACITY",
                defaults::GROUP_QUEUE_CAPACITY,
            ),
            check_invariants: env_get_bool("LQ_CHECK_INVARIANTS", defaults::CHECK_INVARIANTS),
        }
    }

    /// Create config with library defaults only (no env override).
    pub fn new() -> Self {
        Self {
            max_groups: defaults::MAX_GROUPS,
            promotion_credit: defaults::PROMOTION_CREDIT,
            unlabeled_capacity: defaults::UNLABELED_CAPACITY,
            group_queue_capacity: defaults::GROUP_QUEUE_CAPACITY,
            check_invariants: defaults::CHECK_INVARIANTS,
        }
    }

    // Builder methods

    pub fn max_groups(mut self, n: usize) -> Self {
        self.max_groups = n;
        self
    }

    pub fn promotion_credit(mut self, credit: i32) -> Self {
        self.promotion_credit = credit;
        self
    }

    pub fn unlabeled_capacity(mut self, cap: usize) -> Self {
        self.unlabeled_capacity = cap;
        self
    }

    pub fn group_queue_capacity(mut self, cap: usize) -> Self {
        self.group_queue_capacity = cap;
        self
    }

    pub fn check_invariants(mut self, enable: bool) -> Self {
        self.check_invariants = enable;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_groups == 0 {
            return Err(ConfigError::InvalidValue("max_groups must be > 0"));
        }
        if self.max_groups >= u32::MAX as usize {
            return Err(ConfigError::InvalidValue("max_groups must fit in a u32 slot index"));
        }
        if self.promotion_credit < 1 {
            return Err(ConfigError::InvalidValue("promotion_credit must be >= 1"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("labelq configuration:");
        eprintln!("  max_groups:            {}", self.max_groups);
        eprintln!("  promotion_credit:      {}", self.promotion_credit);
        eprintln!("  unlabeled_capacity:    {}", self.unlabeled_capacity);
        eprintln!("  group_queue_capacity:  {}", self.group_queue_capacity);
        eprintln!("  check_invariants:      {}", self.check_invariants);
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = QueueConfig::new();
        assert_eq!(config.max_groups, defaults::MAX_GROUPS);
        assert_eq!(config.promotion_credit, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = QueueConfig::new()
            .max_groups(16)
            .promotion_credit(4)
            .group_queue_capacity(2)
            .check_invariants(true);

        assert_eq!(config.max_groups, 16);
        assert_eq!(config.promotion_credit, 4);
        assert_eq!(config.group_queue_capacity, 2);
        assert!(config.check_invariants);
    }

    #[test]
    fn test_validation() {
        let config = QueueConfig::new().max_groups(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidValue("max_groups must be > 0"))
        );

        let config = QueueConfig::new().promotion_credit(0);
        assert!(config.validate().is_err());
    }
}
