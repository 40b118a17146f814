use crate::{
    domain::Position,
    error::{KanbanError, Result},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tokio::fs;

/// Numbering policy shared by the allocator, normalizer and move engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// First position of a normalized parent
    pub base_position: f64,
    /// Clamp out-of-range target indexes to the nearest end instead of
    /// rejecting them
    pub clamp_target_index: bool,
}

impl OrderingConfig {
    pub fn base(&self) -> Position {
        Position::new(self.base_position).unwrap_or(Position::BASE)
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            base_position: Position::BASE.value(),
            clamp_target_index: true,
        }
    }
}

/// Board service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub ordering: OrderingConfig,
    /// How long a request waits for its board before giving up
    pub lock_timeout_ms: u64,
    /// Renumber the parent after a card or list is deleted
    pub normalize_on_delete: bool,
    /// Events buffered per board before slow subscribers start lagging
    pub broadcast_capacity: usize,
}

impl ServiceConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Parses a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| {
            KanbanError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ordering.base_position.is_finite() {
            return Err(KanbanError::ConfigError(
                "ordering.base_position must be a finite number".to_string(),
            ));
        }
        if self.lock_timeout_ms == 0 {
            return Err(KanbanError::ConfigError(
                "lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.broadcast_capacity == 0 {
            return Err(KanbanError::ConfigError(
                "broadcast_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingConfig::default(),
            lock_timeout_ms: 5_000,
            normalize_on_delete: true,
            broadcast_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.ordering.base(), Position::BASE);
        assert!(config.ordering.clamp_target_index);
        assert!(config.normalize_on_delete);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "lock_timeout_ms": 250, "ordering": { "clamp_target_index": false } }"#;
        let config = ServiceConfig::from_json_str(json).unwrap();

        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
        assert!(!config.ordering.clamp_target_index);
        assert_eq!(config.ordering.base_position, 1.0);
        assert_eq!(config.broadcast_capacity, 64);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = ServiceConfig::from_json_str(r#"{ "lock_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, KanbanError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kanban.json");
        tokio::fs::write(&path, r#"{ "normalize_on_delete": false }"#)
            .await
            .unwrap();

        let config = ServiceConfig::load(&path).await.unwrap();
        assert!(!config.normalize_on_delete);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = ServiceConfig::load(temp_dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::ConfigError(_)));
    }
}
