use crate::domain::ItemKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KanbanError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("Invalid move target: {0}")]
    InvalidTarget(String),

    #[error("{kind} not found: {id}")]
    ItemNotFound { kind: ItemKind, id: String },

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("No free position left in {parent} after normalization")]
    AllocationExhausted { parent: String },

    #[error("Timed out after {waited_ms}ms waiting for board {board}")]
    ConcurrencyTimeout { board: String, waited_ms: u64 },

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl KanbanError {
    pub(crate) fn card_not_found(id: impl ToString) -> Self {
        Self::ItemNotFound {
            kind: ItemKind::Card,
            id: id.to_string(),
        }
    }

    pub(crate) fn list_not_found(id: impl ToString) -> Self {
        Self::ItemNotFound {
            kind: ItemKind::List,
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same request against a fresh snapshot.
    ///
    /// Only contention and exhausted position space are transient; every
    /// other kind describes a request that will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllocationExhausted { .. } | Self::ConcurrencyTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(KanbanError::ConcurrencyTimeout {
            board: "b".to_string(),
            waited_ms: 10,
        }
        .is_retryable());
        assert!(KanbanError::AllocationExhausted {
            parent: "list".to_string(),
        }
        .is_retryable());

        assert!(!KanbanError::InvalidTarget("index".to_string()).is_retryable());
        assert!(!KanbanError::card_not_found("c1").is_retryable());
    }

    #[test]
    fn test_item_not_found_message() {
        let err = KanbanError::list_not_found("abc");
        assert_eq!(err.to_string(), "List not found: abc");
    }
}
